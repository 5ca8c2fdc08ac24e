use dashmap::DashMap;
use std::net::IpAddr;

const WINDOW_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy)]
struct AttemptWindow {
    failures: u32,
    window_start: i64,
}

/// Counts failed logins per client IP in fixed one-minute windows
pub struct LoginThrottle {
    attempts: DashMap<IpAddr, AttemptWindow>,
    max_failures_per_minute: u32,
}

impl LoginThrottle {
    pub fn new(max_failures_per_minute: u32) -> Self {
        Self {
            attempts: DashMap::new(),
            max_failures_per_minute,
        }
    }

    pub fn is_blocked(&self, ip: IpAddr, current_time: i64) -> bool {
        match self.attempts.get(&ip) {
            Some(window) => {
                current_time - window.window_start < WINDOW_SECONDS
                    && window.failures >= self.max_failures_per_minute
            }
            None => false,
        }
    }

    pub fn record_failure(&self, ip: IpAddr, current_time: i64) {
        let mut window = self.attempts.entry(ip).or_insert(AttemptWindow {
            failures: 0,
            window_start: current_time,
        });

        if current_time - window.window_start >= WINDOW_SECONDS {
            window.window_start = current_time;
            window.failures = 0;
        }

        window.failures += 1;
    }

    /// Forget failures after a successful login
    pub fn reset(&self, ip: IpAddr) {
        self.attempts.remove(&ip);
    }

    pub fn cleanup_old_entries(&self, current_time: i64) -> usize {
        let before = self.attempts.len();
        self.attempts
            .retain(|_, window| current_time - window.window_start < WINDOW_SECONDS);
        before - self.attempts.len()
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))
    }

    #[test]
    fn test_fresh_ip_not_blocked() {
        let throttle = LoginThrottle::new(3);
        assert!(!throttle.is_blocked(ip(), 1000));
    }

    #[test]
    fn test_blocks_after_max_failures() {
        let throttle = LoginThrottle::new(3);

        for _ in 0..2 {
            throttle.record_failure(ip(), 1000);
        }
        assert!(!throttle.is_blocked(ip(), 1000));

        throttle.record_failure(ip(), 1000);
        assert!(throttle.is_blocked(ip(), 1010));
    }

    #[test]
    fn test_window_expires() {
        let throttle = LoginThrottle::new(2);
        throttle.record_failure(ip(), 1000);
        throttle.record_failure(ip(), 1000);
        assert!(throttle.is_blocked(ip(), 1059));
        assert!(!throttle.is_blocked(ip(), 1060));

        // A failure in the new window starts counting from one
        throttle.record_failure(ip(), 1060);
        assert!(!throttle.is_blocked(ip(), 1060));
    }

    #[test]
    fn test_reset_on_success() {
        let throttle = LoginThrottle::new(1);
        throttle.record_failure(ip(), 1000);
        assert!(throttle.is_blocked(ip(), 1000));

        throttle.reset(ip());
        assert!(!throttle.is_blocked(ip(), 1000));
        assert!(throttle.is_empty());
    }

    #[test]
    fn test_ips_are_independent() {
        let throttle = LoginThrottle::new(1);
        let v6 = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));

        throttle.record_failure(ip(), 1000);
        assert!(throttle.is_blocked(ip(), 1000));
        assert!(!throttle.is_blocked(v6, 1000));
    }

    #[test]
    fn test_cleanup_old_entries() {
        let throttle = LoginThrottle::new(5);
        throttle.record_failure(ip(), 1000);
        throttle.record_failure(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 1050);

        let removed = throttle.cleanup_old_entries(1070);
        assert_eq!(removed, 1);
        assert_eq!(throttle.len(), 1);
    }
}
