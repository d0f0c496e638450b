use crate::{
    config::{Config, ResponseMode},
    error::ForwardError,
    protocol::{decode_response, Roi},
};
use log::{debug, warn};
use std::{
    io::prelude::*,
    net::{IpAddr, SocketAddr, TcpStream},
};

/// Forwards ROIs to the classification server, one connection per call.
///
/// The client only carries configuration. Every [`forward`](Self::forward)
/// opens, uses and drops its own socket, so a shared client can be called
/// from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct RoiClient {
    config: Config,
}

impl RoiClient {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Creates a client using the config named by `ROI_BRIDGE_CONFIG`.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sends the ROI and waits for the single-line response.
    pub fn forward(&self, roi: Roi) -> Result<String, ForwardError> {
        self.config.validate()?;
        let addr = peer_addr(&self.config)?;
        let mut stream = self.connect(addr)?;
        debug!("Connected to server {}", addr);

        // A socket without the configured timeouts could block forever.
        let timeout = self.config.read_timeout();
        stream
            .set_read_timeout(timeout)
            .and_then(|()| stream.set_write_timeout(timeout))
            .map_err(ForwardError::SocketCreateFailed)?;

        let line = roi.request_line();
        stream
            .write_all(line.as_bytes())
            .map_err(ForwardError::SendFailed)?;
        debug!("Sent {:?}", line);

        let bytes = read_response(&mut stream, &self.config)?;
        let response = decode_response(&bytes);
        debug!("Received {:?} from {}", response, addr);

        Ok(response)
    }

    fn connect(&self, addr: SocketAddr) -> Result<TcpStream, ForwardError> {
        let result = match self.config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        result.map_err(|err| ForwardError::from_connect(addr, err))
    }
}

/// Parses the configured host as an IP literal. Host names are not resolved.
pub(crate) fn peer_addr(config: &Config) -> Result<SocketAddr, ForwardError> {
    let ip: IpAddr = config
        .host
        .parse()
        .map_err(|_| ForwardError::AddressInvalid(config.host.clone()))?;
    Ok(SocketAddr::new(ip, config.port))
}

fn read_response<R>(reader: &mut R, config: &Config) -> Result<Vec<u8>, ForwardError>
where
    R: Read,
{
    let mut buf = vec![0u8; config.max_response_len];

    let len = match config.response_mode {
        ResponseMode::SingleRead => reader.read(&mut buf),
        ResponseMode::Line => read_line(reader, &mut buf),
    }
    .map_err(|err| ForwardError::NoResponse(Some(err)))?;

    if len == 0 {
        return Err(ForwardError::NoResponse(None));
    }
    buf.truncate(len);
    Ok(buf)
}

/// Fills `buf` until it holds a newline, the peer closes or it is full.
fn read_line<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: Read,
{
    let mut len = 0;

    while len < buf.len() {
        let count = match reader.read(&mut buf[len..]) {
            Ok(count) => count,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) if len > 0 => {
                warn!("Read error after {} response bytes: {}", len, err);
                break;
            }
            Err(err) => return Err(err),
        };
        if count == 0 {
            break;
        }
        let found = buf[len..len + count].contains(&b'\n');
        len += count;
        if found {
            break;
        }
    }

    Ok(len)
}
