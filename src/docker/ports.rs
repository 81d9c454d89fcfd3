// Free port search for the published notebook port
// A few sequential guesses near the base port, then random ones around it

use crate::errors::{LaunchError, Result};
use rand::Rng;
use std::net::{Ipv4Addr, TcpListener};

/// Number of sequential candidates tried before random ones
const SEQUENTIAL_CANDIDATES: usize = 5;

/// Generate `n` candidate ports near `base`.
///
/// The first five are `base, base+1, ...`; the rest are drawn uniformly
/// from `[base - 2n, base + 2n]`, clamped to the valid port range.
pub fn candidate_ports<R: Rng>(base: u16, n: usize, rng: &mut R) -> Vec<u16> {
    let mut ports = Vec::with_capacity(n);

    for i in 0..n.min(SEQUENTIAL_CANDIDATES) {
        ports.push(base.saturating_add(i as u16));
    }

    let spread = 2 * n as i64;
    for _ in 0..n.saturating_sub(SEQUENTIAL_CANDIDATES) {
        let offset = rng.gen_range(-spread..=spread);
        let port = (base as i64 + offset).clamp(1, u16::MAX as i64);
        ports.push(port as u16);
    }

    ports
}

/// Whether a TCP listener can be bound on 127.0.0.1:`port` right now
pub fn is_port_free(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok()
}

/// Find a bindable port, trying `retries + 1` candidates around `base`
pub fn find_free_port(base: u16, retries: usize) -> Result<u16> {
    let mut rng = rand::thread_rng();
    find_free_port_with(base, retries, &mut rng, is_port_free)
}

fn find_free_port_with<R: Rng>(
    base: u16,
    retries: usize,
    rng: &mut R,
    mut is_free: impl FnMut(u16) -> bool,
) -> Result<u16> {
    for port in candidate_ports(base, retries + 1, rng) {
        if is_free(port) {
            tracing::debug!(port, "found free port");
            return Ok(port);
        }
        tracing::trace!(port, "port in use");
    }

    Err(LaunchError::NoFreePort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_first_candidates_are_sequential() {
        let mut rng = StdRng::seed_from_u64(7);
        let ports = candidate_ports(8888, 51, &mut rng);

        assert_eq!(ports.len(), 51);
        assert_eq!(&ports[..5], &[8888, 8889, 8890, 8891, 8892]);
    }

    #[test]
    fn test_random_candidates_stay_in_window() {
        let mut rng = StdRng::seed_from_u64(42);
        let ports = candidate_ports(8888, 51, &mut rng);

        for &port in &ports[5..] {
            assert!((8888 - 102..=8888 + 102).contains(&port), "port {} out of range", port);
        }
    }

    #[test]
    fn test_small_candidate_count() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(candidate_ports(3000, 3, &mut rng), vec![3000, 3001, 3002]);
        assert!(candidate_ports(3000, 0, &mut rng).is_empty());
    }

    #[test]
    fn test_candidates_clamped_at_low_end() {
        let mut rng = StdRng::seed_from_u64(3);
        let ports = candidate_ports(2, 40, &mut rng);
        assert!(ports.iter().all(|&p| p >= 1));
    }

    #[test]
    fn test_candidates_clamped_at_high_end() {
        let mut rng = StdRng::seed_from_u64(5);
        let ports = candidate_ports(65534, 40, &mut rng);

        assert_eq!(&ports[..5], &[65534, 65535, 65535, 65535, 65535]);
        // No wrap-around to low ports
        assert!(ports.iter().all(|&p| p >= 65534 - 80), "{:?}", ports);
    }

    #[test]
    fn test_skips_busy_ports() {
        let mut rng = StdRng::seed_from_u64(9);
        let port = find_free_port_with(8888, 50, &mut rng, |p| p == 8891).unwrap();
        assert_eq!(port, 8891);
    }

    #[test]
    fn test_no_free_port() {
        let mut rng = StdRng::seed_from_u64(9);
        let result = find_free_port_with(8888, 10, &mut rng, |_| false);
        assert!(matches!(result, Err(LaunchError::NoFreePort)));
    }

    #[test]
    fn test_port_in_use_is_skipped() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let taken = listener.local_addr().unwrap().port();

        assert!(!is_port_free(taken));
        let port = find_free_port(taken, 50).unwrap();
        assert_ne!(port, taken);
    }
}
