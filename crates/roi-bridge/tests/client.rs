use roi_bridge::{Config, ForwardError, ResponseMode, Roi, RoiClient};
use std::{
    io::{prelude::*, BufReader},
    net::{TcpListener, TcpStream},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

/// A one-shot peer: accepts `conns` connections and runs `handle` on each,
/// returning the request lines it saw.
fn spawn_peer<F>(conns: usize, handle: F) -> (u16, JoinHandle<Vec<String>>)
where
    F: Fn(&mut TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        (0..conns)
            .map(|_| {
                let (mut stream, _) = listener.accept().unwrap();
                let mut line = String::new();
                BufReader::new(&mut stream).read_line(&mut line).unwrap();
                handle(&mut stream);
                line
            })
            .collect()
    });

    (port, handle)
}

fn client(port: u16) -> RoiClient {
    RoiClient::new(Config::default().with_endpoint("127.0.0.1", port))
}

#[test]
fn forward_returns_stripped_response() {
    let (port, peer) = spawn_peer(1, |stream| {
        stream.write_all(b"OK detected=true\n").unwrap();
    });

    let response = client(port).forward(Roi::new(-3, 4, 100, 200)).unwrap();
    assert_eq!(response, "OK detected=true");

    let lines = peer.join().unwrap();
    assert_eq!(lines, vec!["ROI -3 4 100 200\n".to_string()]);
}

#[test]
fn zero_roi_is_framed_verbatim() {
    let (port, peer) = spawn_peer(1, |stream| {
        stream.write_all(b"Neutral\n").unwrap();
    });

    client(port).forward(Roi::new(0, 0, 0, 0)).unwrap();
    assert_eq!(peer.join().unwrap(), vec!["ROI 0 0 0 0\n".to_string()]);
}

#[test]
fn peer_closing_silently_is_no_response() {
    let (port, peer) = spawn_peer(1, |_stream| {});

    let result = client(port).forward(Roi::new(1, 2, 3, 4));
    assert!(matches!(result, Err(ForwardError::NoResponse(_))), "{:?}", result);
    peer.join().unwrap();
}

#[test]
fn response_without_newline_is_truncated() {
    let first: Vec<u8> = (0..1024).map(|idx| b'a' + (idx % 26) as u8).collect();
    let expected = String::from_utf8(first.clone()).unwrap();

    let (port, peer) = spawn_peer(1, move |stream| {
        stream.write_all(&first).unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(50));
        // Never read: the client takes one buffer and hangs up.
        let _ = stream.write_all(&[b'z'; 976]);
    });

    let response = client(port).forward(Roi::new(1, 2, 3, 4)).unwrap();
    assert_eq!(response, expected);
    peer.join().unwrap();
}

#[test]
fn line_mode_fills_the_whole_buffer() {
    let (port, peer) = spawn_peer(1, |stream| {
        stream.write_all(&[b'a'; 600]).unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(50));
        // The client hangs up once its buffer is full.
        let _ = stream.write_all(&[b'b'; 1400]);
    });

    let config = Config {
        response_mode: ResponseMode::Line,
        ..Config::default().with_endpoint("127.0.0.1", port)
    };
    let response = RoiClient::new(config).forward(Roi::new(1, 2, 3, 4)).unwrap();
    assert_eq!(response.len(), 1024);
    assert!(response.starts_with(&"a".repeat(600)));
    assert!(response.ends_with(&"b".repeat(424)));
    peer.join().unwrap();
}

#[test]
fn no_listener_is_connect_failed() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let result = client(port).forward(Roi::new(1, 2, 3, 4));
    assert!(
        matches!(result, Err(ForwardError::ConnectFailed { .. })),
        "{:?}",
        result
    );
}

#[test]
fn invalid_address_opens_no_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    listener.set_nonblocking(true).unwrap();

    let client = RoiClient::new(Config::default().with_endpoint("not an address", port));
    let result = client.forward(Roi::new(1, 2, 3, 4));
    assert!(matches!(result, Err(ForwardError::AddressInvalid(_))));

    let err = listener.accept().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
}

#[test]
fn zero_config_values_open_no_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    listener.set_nonblocking(true).unwrap();

    let base = Config::default().with_endpoint("127.0.0.1", port);
    let configs = [
        Config {
            connect_timeout_ms: Some(0),
            ..base.clone()
        },
        Config {
            read_timeout_ms: Some(0),
            ..base.clone()
        },
        Config {
            max_response_len: 0,
            ..base.clone()
        },
    ];

    for config in configs {
        let result = RoiClient::new(config.clone()).forward(Roi::new(1, 2, 3, 4));
        assert!(
            matches!(result, Err(ForwardError::InvalidConfig(_))),
            "{:?}: {:?}",
            config,
            result
        );
    }

    let err = listener.accept().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
}

#[test]
fn short_timeouts_still_get_the_reply() {
    let (port, peer) = spawn_peer(1, |stream| {
        stream.write_all(b"Calm\n").unwrap();
    });

    let config = Config {
        connect_timeout_ms: Some(1000),
        read_timeout_ms: Some(1000),
        ..Config::default().with_endpoint("127.0.0.1", port)
    };
    let response = RoiClient::new(config).forward(Roi::new(1, 2, 3, 4)).unwrap();
    assert_eq!(response, "Calm");
    peer.join().unwrap();
}

#[test]
fn sequential_calls_use_separate_connections() {
    let (port, peer) = spawn_peer(2, |stream| {
        stream.write_all(b"Happy\n").unwrap();
    });

    let client = client(port);
    assert_eq!(client.forward(Roi::new(1, 1, 8, 8)).unwrap(), "Happy");
    assert_eq!(client.forward(Roi::new(2, 2, 8, 8)).unwrap(), "Happy");

    let lines = peer.join().unwrap();
    assert_eq!(lines, vec!["ROI 1 1 8 8\n", "ROI 2 2 8 8\n"]);
}

#[test]
fn read_timeout_ends_a_silent_exchange() {
    let (port, peer) = spawn_peer(1, |_stream| {
        thread::sleep(Duration::from_millis(500));
    });

    let config = Config {
        read_timeout_ms: Some(100),
        ..Config::default().with_endpoint("127.0.0.1", port)
    };
    let result = RoiClient::new(config).forward(Roi::new(1, 2, 3, 4));
    assert!(
        matches!(result, Err(ForwardError::NoResponse(Some(_)))),
        "{:?}",
        result
    );
    peer.join().unwrap();
}

#[test]
fn concurrent_calls_share_one_client() {
    let (port, peer) = spawn_peer(4, |stream| {
        stream.write_all(b"Surprise\n").unwrap();
    });

    let client = Arc::new(client(port));
    let workers: Vec<_> = (0..4)
        .map(|idx| {
            let client = client.clone();
            thread::spawn(move || client.forward(Roi::new(idx, idx, 16, 16)))
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap().unwrap(), "Surprise");
    }

    let mut lines = peer.join().unwrap();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "ROI 0 0 16 16\n",
            "ROI 1 1 16 16\n",
            "ROI 2 2 16 16\n",
            "ROI 3 3 16 16\n"
        ]
    );
}
