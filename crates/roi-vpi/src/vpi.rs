//! Binding of [`SendRoiTask`] to the Verilog Procedural Interface.
//!
//! The VPI entry points live in the simulator executable that loads this
//! library (`vvp -M. -mroi_vpi ...`). They are looked up with `dlsym` when
//! the library is loaded instead of being linked, so the crate builds and
//! tests without a simulator around.

use crate::{
    logger::{self, HostLogger},
    task::{SendRoiTask, TaskHost},
};
use libc::{c_char, c_int, c_void};
use roi_bridge::RoiClient;
use std::{
    ffi::{CStr, CString},
    mem,
    panic::{self, AssertUnwindSafe},
    ptr,
    sync::OnceLock,
};

type VpiHandle = *mut c_void;
type CallTf = unsafe extern "C" fn(*mut c_char) -> c_int;

const VPI_SYS_TASK: c_int = 1;
const VPI_INT_VAL: c_int = 6;
const VPI_SYS_TF_CALL: c_int = 85;
const VPI_ARGUMENT: c_int = 89;

const TASK_NAME: &CStr = c"$send_roi_for_emotion";

/// `s_vpi_systf_data`
#[repr(C)]
#[allow(dead_code)]
struct SystfData {
    kind: c_int,
    sysfunctype: c_int,
    tfname: *const c_char,
    calltf: Option<CallTf>,
    compiletf: Option<CallTf>,
    sizetf: Option<CallTf>,
    user_data: *mut c_char,
}

/// The `value` union of `s_vpi_value`. Only the integer member is read.
#[repr(C)]
#[derive(Clone, Copy)]
#[allow(dead_code)]
union ValueUnion {
    integer: c_int,
    real: f64,
    misc: *mut c_char,
}

/// `s_vpi_value`
#[repr(C)]
#[allow(dead_code)]
struct Value {
    format: c_int,
    value: ValueUnion,
}

/// VPI routines used by the task.
struct Vpi {
    register_systf: unsafe extern "C" fn(*mut SystfData) -> VpiHandle,
    handle: unsafe extern "C" fn(c_int, VpiHandle) -> VpiHandle,
    iterate: unsafe extern "C" fn(c_int, VpiHandle) -> VpiHandle,
    scan: unsafe extern "C" fn(VpiHandle) -> VpiHandle,
    get_value: unsafe extern "C" fn(VpiHandle, *mut Value),
    printf: unsafe extern "C" fn(*const c_char, ...) -> c_int,
}

impl Vpi {
    /// The simulator's VPI routines, or `None` when not loaded by one.
    fn get() -> Option<&'static Self> {
        static VPI: OnceLock<Option<Vpi>> = OnceLock::new();
        VPI.get_or_init(|| unsafe { Self::resolve() }).as_ref()
    }

    unsafe fn resolve() -> Option<Self> {
        Some(Self {
            register_systf: symbol(c"vpi_register_systf")?,
            handle: symbol(c"vpi_handle")?,
            iterate: symbol(c"vpi_iterate")?,
            scan: symbol(c"vpi_scan")?,
            get_value: symbol(c"vpi_get_value")?,
            printf: symbol(c"vpi_printf")?,
        })
    }

    fn print(&self, text: &str) {
        let Ok(text) = CString::new(text.replace('\0', "")) else {
            return;
        };
        unsafe {
            (self.printf)(c"%s".as_ptr(), text.as_ptr());
        }
    }
}

/// Looks up `name` in the global symbol scope and casts it to the function
/// pointer type `F`.
unsafe fn symbol<F>(name: &CStr) -> Option<F> {
    debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<*mut c_void>());

    let ptr = libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr());
    if ptr.is_null() {
        None
    } else {
        Some(mem::transmute_copy(&ptr))
    }
}

/// The system task call currently executing in the simulator.
struct VpiHost {
    vpi: &'static Vpi,
}

impl TaskHost for VpiHost {
    fn arguments(&mut self) -> Option<Vec<i32>> {
        let vpi = self.vpi;

        unsafe {
            let call = (vpi.handle)(VPI_SYS_TF_CALL, ptr::null_mut());
            let iter = (vpi.iterate)(VPI_ARGUMENT, call);
            if iter.is_null() {
                return None;
            }

            // Scanning to the end releases the iterator.
            let mut args = vec![];
            loop {
                let arg = (vpi.scan)(iter);
                if arg.is_null() {
                    break;
                }

                let mut value = Value {
                    format: VPI_INT_VAL,
                    value: ValueUnion { integer: 0 },
                };
                (vpi.get_value)(arg, &mut value);
                args.push(value.value.integer);
            }

            Some(args)
        }
    }

    fn print(&mut self, text: &str) {
        self.vpi.print(text);
    }
}

/// `calltf` of the system task. `user_data` points at the leaked
/// [`SendRoiTask`] created during registration.
unsafe extern "C" fn send_roi_calltf(user_data: *mut c_char) -> c_int {
    let Some(vpi) = Vpi::get() else {
        return 0;
    };
    let Some(task) = (user_data as *const SendRoiTask).as_ref() else {
        return 0;
    };

    let mut host = VpiHost { vpi };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.call(&mut host)));
    if outcome.is_err() {
        vpi.print(&format!("ERROR: {} panicked\n", SendRoiTask::NAME));
    }

    0
}

/// Registers the system task with the simulator. Runs once when the library
/// is loaded.
extern "C" fn register_send_roi() {
    let Some(vpi) = Vpi::get() else {
        eprintln!("roi_vpi: VPI routines not found, is this loaded by a simulator?");
        return;
    };

    let logger = HostLogger::new(logger::level_from_env(), move |text: &str| vpi.print(text));
    if logger.install().is_err() {
        vpi.print("WARNING: a logger is already installed, roi_vpi logs are not forwarded\n");
    }

    let client = RoiClient::from_env().unwrap_or_else(|err| {
        vpi.print(&format!("ERROR: {:#}. Falling back to the default config\n", err));
        RoiClient::default()
    });
    let task: &'static SendRoiTask = Box::leak(Box::new(SendRoiTask::new(client)));

    let mut data = SystfData {
        kind: VPI_SYS_TASK,
        sysfunctype: 0,
        tfname: TASK_NAME.as_ptr(),
        calltf: Some(send_roi_calltf),
        compiletf: None,
        sizetf: None,
        user_data: task as *const SendRoiTask as *mut c_char,
    };
    unsafe {
        (vpi.register_systf)(&mut data);
    }
}

/// Startup table scanned by the simulator after loading the library.
#[no_mangle]
#[allow(non_upper_case_globals)]
pub static vlog_startup_routines: [Option<extern "C" fn()>; 2] = [Some(register_send_roi), None];
