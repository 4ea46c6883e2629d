//! Host/port addresses carried by messages.

use crate::error::{MessageError, NetworkError};
use std::fmt;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

/// Longest DNS host name accepted, in characters.
const MAX_HOST_LEN: usize = 253;

/// Longest single DNS label, in characters.
const MAX_LABEL_LEN: usize = 63;

/// Check whether a host/port pair is a usable message address.
///
/// The port must lie strictly between 0 and 65535. The host must be an IP
/// literal or a syntactically valid DNS host name. No lookup is performed
/// here; resolution happens when the message is sent.
///
/// # Example
///
/// ```rust
/// use iris_transport::is_valid_address;
///
/// assert!(is_valid_address("127.0.0.1", 9999));
/// assert!(is_valid_address("localhost", 8080));
/// assert!(!is_valid_address("127.0.0.1", 0));
/// assert!(!is_valid_address("not a host", 8080));
/// ```
pub fn is_valid_address(host: &str, port: u16) -> bool {
    if port == 0 || port == u16::MAX {
        return false;
    }
    host.parse::<IpAddr>().is_ok() || is_valid_hostname(host)
}

fn is_valid_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > MAX_HOST_LEN {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Destination or origin of a message: a host and a port.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    host: String,
    port: u16,
}

impl Address {
    /// Create a validated address.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Init`] if [`is_valid_address`] rejects the pair.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, MessageError> {
        let host = host.into();
        if !is_valid_address(&host, port) {
            return Err(MessageError::Init(format!(
                "invalid address {}:{}",
                host, port
            )));
        }
        Ok(Self { host, port })
    }

    /// Host part (IP literal or host name).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port part.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve to the first matching socket address.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Resolution`] if the lookup fails or yields nothing.
    pub fn resolve(&self) -> Result<SocketAddr, NetworkError> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        let mut candidates = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| NetworkError::Resolution {
                address: self.to_string(),
                reason: e.to_string(),
            })?;
        candidates.next().ok_or_else(|| NetworkError::Resolution {
            address: self.to_string(),
            reason: "no addresses returned".to_string(),
        })
    }
}

/// Addresses observed on the wire are taken as-is.
impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
