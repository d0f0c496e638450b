use roi_bridge::{Config, ForwardError, RoiClient};
use roi_vpi::{SendRoiTask, TaskError, TaskHost};
use std::{
    io::{prelude::*, BufReader, ErrorKind},
    net::TcpListener,
    thread,
    time::Duration,
};

/// Stands in for the simulator: fixed arguments, captured output.
struct RecordingHost {
    args: Option<Vec<i32>>,
    output: String,
}

impl RecordingHost {
    fn new(args: Option<Vec<i32>>) -> Self {
        Self {
            args,
            output: String::new(),
        }
    }
}

impl TaskHost for RecordingHost {
    fn arguments(&mut self) -> Option<Vec<i32>> {
        self.args.clone()
    }

    fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }
}

fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn task(port: u16) -> SendRoiTask {
    SendRoiTask::new(RoiClient::new(
        Config::default().with_endpoint("127.0.0.1", port),
    ))
}

/// Asserts that nobody connected to `listener`.
fn assert_no_connection(listener: &TcpListener) {
    listener.set_nonblocking(true).unwrap();
    thread::sleep(Duration::from_millis(50));
    let err = listener.accept().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WouldBlock);
}

#[test]
fn reports_the_response_in_a_banner() {
    let (listener, port) = listener();
    let peer = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut line = String::new();
        BufReader::new(&mut stream).read_line(&mut line).unwrap();
        stream.write_all(b"OK detected=true\n").unwrap();
        line
    });

    let mut host = RecordingHost::new(Some(vec![10, 20, 30, 40]));
    let response = task(port).call(&mut host).unwrap();

    assert_eq!(response, "OK detected=true");
    assert_eq!(peer.join().unwrap(), "ROI 10 20 30 40\n");
    assert_eq!(
        host.output,
        "Sending ROI (x=10, y=20, w=30, h=40)\n\
         --------------------------------------------------\n\
         Received Result: OK detected=true\n\
         --------------------------------------------------\n"
    );
}

#[test]
fn zero_arguments_make_no_connection() {
    let (listener, port) = listener();
    let task = task(port);

    for args in [None, Some(vec![])] {
        let mut host = RecordingHost::new(args);
        let result = task.call(&mut host);

        assert!(matches!(result, Err(TaskError::MissingArguments)));
        assert_eq!(
            host.output,
            "ERROR: $send_roi_for_emotion requires arguments (x, y, w, h)\n"
        );
    }

    assert_no_connection(&listener);
}

#[test]
fn wrong_argument_count_makes_no_connection() {
    let (listener, port) = listener();
    let task = task(port);

    for args in [vec![1, 2, 3], vec![1, 2, 3, 4, 5]] {
        let count = args.len();
        let mut host = RecordingHost::new(Some(args));
        let result = task.call(&mut host);
        assert!(matches!(result, Err(TaskError::WrongArgumentCount(n)) if n == count));
    }

    assert_no_connection(&listener);
}

#[test]
fn missing_server_is_reported_not_raised() {
    let port = listener().1;

    let mut host = RecordingHost::new(Some(vec![1, 2, 3, 4]));
    let result = task(port).call(&mut host);

    assert!(matches!(
        result,
        Err(TaskError::Forward(ForwardError::ConnectFailed { .. }))
    ));
    assert!(host.output.starts_with("Sending ROI (x=1, y=2, w=3, h=4)\n"));
    assert!(host.output.contains("ERROR: connection to 127.0.0.1:"));
    assert!(host.output.ends_with("Is the emotion server running?\n"));
}

#[test]
fn silent_server_is_no_response() {
    let (listener, port) = listener();
    let peer = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut line = String::new();
        BufReader::new(&mut stream).read_line(&mut line).unwrap();
    });

    let mut host = RecordingHost::new(Some(vec![1, 2, 3, 4]));
    let result = task(port).call(&mut host);
    peer.join().unwrap();

    assert!(matches!(
        result,
        Err(TaskError::Forward(ForwardError::NoResponse(_)))
    ));
    assert!(host.output.ends_with("ERROR: no response from server\n"));
}

#[test]
fn each_call_opens_its_own_connection() {
    let (listener, port) = listener();
    let peer = thread::spawn(move || {
        (0..2)
            .map(|idx| {
                let (mut stream, _) = listener.accept().unwrap();
                let mut line = String::new();
                BufReader::new(&mut stream).read_line(&mut line).unwrap();
                writeln!(stream, "reply {}", idx).unwrap();
                line
            })
            .collect::<Vec<_>>()
    });

    let task = task(port);
    let mut host = RecordingHost::new(Some(vec![0, 0, 0, 0]));
    assert_eq!(task.call(&mut host).unwrap(), "reply 0");

    let mut host = RecordingHost::new(Some(vec![-1, -1, 5, 5]));
    assert_eq!(task.call(&mut host).unwrap(), "reply 1");

    assert_eq!(
        peer.join().unwrap(),
        vec!["ROI 0 0 0 0\n", "ROI -1 -1 5 5\n"]
    );
}
