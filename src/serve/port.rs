use crate::error::ZettelError;
use std::{net::TcpListener, ops::Range};

/// Ports probed when none is configured.
pub const DEFAULT_PORT_RANGE: Range<u16> = 3000..4000;

/// First port in `range` that a listener can bind on all interfaces.
///
/// Each probe listener is dropped straight away, so the port may be taken again before the
/// caller binds it.
pub fn probe_port(range: Range<u16>) -> Result<u16, ZettelError> {
    for port in range.clone() {
        match TcpListener::bind(("0.0.0.0", port)) {
            Ok(listener) => {
                drop(listener);
                tracing::debug!("Port {port} is free");
                return Ok(port);
            }
            Err(e) => tracing::trace!("Port {port} unavailable: {e}"),
        }
    }
    Err(ZettelError::PortExhausted {
        start: range.start,
        end: range.end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_taken_port_is_skipped() {
        let taken = TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = taken.local_addr().unwrap().port();
        assert_eq!(
            probe_port(port..port + 1),
            Err(ZettelError::PortExhausted {
                start: port,
                end: port + 1
            })
        );
    }

    #[test]
    fn test_empty_range_is_exhausted() {
        assert!(matches!(
            probe_port(5000..5000),
            Err(ZettelError::PortExhausted { .. })
        ));
    }
}
