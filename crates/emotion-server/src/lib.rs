//! Companion server of the `$send_roi_for_emotion` task. Answers each
//! `ROI <x> <y> <w> <h>` line with an emotion label and a confidence.

mod async_server;
mod classifier;
mod server;

pub use async_server::AsyncServer;
pub use classifier::{Classification, Classifier, MockClassifier, EMOTIONS};
pub use server::{Handled, Outcome, Server, DEFAULT_ADDR, MAX_HEADER_LEN};
