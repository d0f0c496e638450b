use crate::{
    client::peer_addr,
    config::{Config, ResponseMode},
    error::ForwardError,
    protocol::{decode_response, Roi},
};
use async_std::{io, net::TcpStream};
use futures::prelude::*;
use log::debug;
use std::{future::Future, time::Duration};

/// The async/.await counterpart of [`RoiClient`](crate::RoiClient).
#[derive(Debug, Clone, Default)]
pub struct AsyncRoiClient {
    config: Config,
}

impl AsyncRoiClient {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn forward(&self, roi: Roi) -> Result<String, ForwardError> {
        self.config.validate()?;
        let addr = peer_addr(&self.config)?;
        let mut stream = with_timeout(self.config.connect_timeout(), TcpStream::connect(addr))
            .await
            .map_err(|err| ForwardError::from_connect(addr, err))?;
        debug!("Connected to server {}", addr);

        let line = roi.request_line();
        with_timeout(self.config.read_timeout(), stream.write_all(line.as_bytes()))
            .await
            .map_err(ForwardError::SendFailed)?;
        debug!("Sent {:?}", line);

        let timeout = self.config.read_timeout();
        let mut buf = vec![0u8; self.config.max_response_len];
        let mut len = 0;

        loop {
            let count = match with_timeout(timeout, stream.read(&mut buf[len..])).await {
                Ok(count) => count,
                Err(err) if len == 0 => return Err(ForwardError::NoResponse(Some(err))),
                Err(_) => break,
            };
            if count == 0 {
                break;
            }
            let found = buf[len..len + count].contains(&b'\n');
            len += count;

            if self.config.response_mode == ResponseMode::SingleRead || found || len == buf.len()
            {
                break;
            }
        }

        if len == 0 {
            return Err(ForwardError::NoResponse(None));
        }

        let response = decode_response(&buf[..len]);
        debug!("Received {:?} from {}", response, addr);
        Ok(response)
    }
}

async fn with_timeout<F, T>(timeout: Option<Duration>, future: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match timeout {
        Some(dur) => io::timeout(dur, future).await,
        None => future.await,
    }
}
