//! # Socket provisioner: addresses in, listen-ready descriptors out.
//!
//! [`Provisioner::provision`] turns the configured address strings into
//! bound, listening TCP sockets, one per address, in input order. Each
//! address is bound **once**, on first use; later calls hand out duplicates
//! of the cached socket. Every worker generation therefore inherits the
//! very same listening sockets — the accept queue survives a reload, which
//! is what makes it gap-free. The kernel keeps the socket alive as long as
//! any duplicate is open, so the port also never closes between a crash and
//! the recovery launch.
//!
//! ## Rules
//! - Output order matches input order (the worker discovers sockets
//!   positionally, starting at fd 3).
//! - Any failure aborts the whole set; duplicates made so far are dropped,
//!   cached bindings are kept for the next attempt.
//! - Sockets are created with SO_REUSEADDR and a backlog of 128, and stay
//!   close-on-exec in the supervisor — the launcher re-maps the duplicates
//!   into the child's fd table explicitly.

use std::collections::HashMap;
use std::net::ToSocketAddrs;
use std::os::fd::OwnedFd;
use std::sync::Mutex;

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::ProvisionError;

/// Listen backlog applied to every provisioned socket.
const BACKLOG: i32 = 128;

/// Bind-once cache of listening sockets, keyed by address string.
///
/// The cache holds the original descriptors for the supervisor's lifetime;
/// launches only ever receive duplicates.
#[derive(Debug, Default)]
pub struct Provisioner {
    bound: Mutex<HashMap<String, OwnedFd>>,
}

impl Provisioner {
    /// Creates an empty provisioner; nothing is bound until first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns one inheritable duplicate per address, in order.
    ///
    /// Binds any address not seen before. An empty address set yields an
    /// empty vector (the worker then runs without inherited sockets). On
    /// error the caller must not spawn.
    pub fn provision(&self, addrs: &[String]) -> Result<Vec<OwnedFd>, ProvisionError> {
        let mut bound = self.bound.lock().expect("provisioner cache poisoned");
        let mut fds = Vec::with_capacity(addrs.len());
        for addr in addrs {
            if !bound.contains_key(addr) {
                bound.insert(addr.clone(), listen_tcp(addr)?);
            }
            let fd = bound[addr]
                .try_clone()
                .map_err(|source| ProvisionError::Dup {
                    addr: addr.clone(),
                    source,
                })?;
            fds.push(fd);
        }
        Ok(fds)
    }
}

/// Resolves a single address string and builds a listening socket for it.
fn listen_tcp(addr: &str) -> Result<OwnedFd, ProvisionError> {
    let sockaddr = addr
        .to_socket_addrs()
        .map_err(|source| ProvisionError::Resolve {
            addr: addr.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| ProvisionError::Resolve {
            addr: addr.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "no socket address produced",
            ),
        })?;

    let bind = || -> std::io::Result<Socket> {
        let domain = Domain::for_address(sockaddr);
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&sockaddr.into())?;
        socket.listen(BACKLOG)?;
        Ok(socket)
    };

    bind()
        .map(OwnedFd::from)
        .map_err(|source| ProvisionError::Bind {
            addr: addr.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpStream;
    use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd};

    #[test]
    fn test_empty_set_yields_empty_vec() {
        let provisioner = Provisioner::new();
        let fds = provisioner.provision(&[]).unwrap();
        assert!(fds.is_empty());
    }

    #[test]
    fn test_provision_ephemeral_ports() {
        let provisioner = Provisioner::new();
        let addrs = vec!["127.0.0.1:0".to_string(), "127.0.0.1:0".to_string()];
        let fds = provisioner.provision(&addrs).unwrap();
        // one address string, one cached binding, two duplicates of it
        assert_eq!(fds.len(), 2);
        assert_ne!(fds[0].as_raw_fd(), fds[1].as_raw_fd());
    }

    #[test]
    fn test_repeated_provision_reuses_binding() {
        let provisioner = Provisioner::new();
        let addrs = vec!["127.0.0.1:0".to_string()];

        let first = provisioner.provision(&addrs).unwrap();
        let port = local_port(&first[0]);
        // second generation while the first duplicate is still open: must
        // not re-bind, must refer to the same listening socket
        let second = provisioner.provision(&addrs).unwrap();
        assert_eq!(local_port(&second[0]), port);

        // a connection accepted through either duplicate proves it is live
        TcpStream::connect(("127.0.0.1", port)).unwrap();
    }

    #[test]
    fn test_unresolvable_address_is_resolve_error() {
        let provisioner = Provisioner::new();
        let err = provisioner
            .provision(&["not an address".to_string()])
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Resolve { .. }), "{err}");
    }

    #[test]
    fn test_occupied_port_is_bind_error() {
        let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = holder.local_addr().unwrap().to_string();
        let provisioner = Provisioner::new();
        let err = provisioner.provision(&[addr.clone()]).unwrap_err();
        match err {
            ProvisionError::Bind { addr: a, .. } => assert_eq!(a, addr),
            other => panic!("expected Bind, got {other}"),
        }
    }

    #[test]
    fn test_failure_aborts_whole_set() {
        let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let occupied = holder.local_addr().unwrap().to_string();
        let provisioner = Provisioner::new();
        let addrs = vec!["127.0.0.1:0".to_string(), occupied];
        assert!(provisioner.provision(&addrs).is_err());
    }

    fn local_port(fd: &OwnedFd) -> u16 {
        let dup = fd.try_clone().unwrap();
        let listener = unsafe { std::net::TcpListener::from_raw_fd(dup.into_raw_fd()) };
        listener.local_addr().unwrap().port()
    }
}
