//! Address admission filter for discovered neighbors.
//!
//! The crawl only follows CDP-discovered addresses that pass this filter;
//! running without one disables discovery entirely, so crawling beyond the
//! seed is strictly opt-in.

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;

use crate::error::{Error, Result};

/// Admission filter over singleton addresses and CIDR ranges.
///
/// Singletons and ranges are stored separately: membership is an equality
/// test for the former and a containment test for the latter.
#[derive(Debug, Clone, Default)]
pub struct AddressFilter {
    addresses: Vec<Ipv4Addr>,
    networks: Vec<Ipv4Network>,
}

impl AddressFilter {
    /// Build a filter from textual entries, e.g. `["10.0.0.5", "10.1.0.0/16"]`.
    ///
    /// Each entry must parse as a single IPv4 address or as an IPv4 network;
    /// anything else fails construction with [`Error::InvalidAddress`].
    pub fn parse<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::default();

        for entry in entries {
            let entry = entry.as_ref().trim();
            if let Ok(address) = entry.parse::<Ipv4Addr>() {
                filter.addresses.push(address);
            } else if let Ok(network) = entry.parse::<Ipv4Network>() {
                filter.networks.push(network);
            } else {
                return Err(Error::InvalidAddress {
                    text: entry.to_string(),
                });
            }
        }

        Ok(filter)
    }

    /// Whether `address` equals a stored singleton or falls within a stored
    /// range.
    pub fn admits(&self, address: Ipv4Addr) -> bool {
        self.addresses.contains(&address)
            || self.networks.iter().any(|network| network.contains(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_match() {
        let filter = AddressFilter::parse(["192.168.1.1"]).unwrap();
        assert!(filter.admits("192.168.1.1".parse().unwrap()));
        assert!(!filter.admits("192.168.1.2".parse().unwrap()));
    }

    #[test]
    fn test_range_containment() {
        let filter = AddressFilter::parse(["10.0.0.0/24"]).unwrap();
        assert!(filter.admits("10.0.0.1".parse().unwrap()));
        assert!(filter.admits("10.0.0.254".parse().unwrap()));
        assert!(!filter.admits("10.0.1.1".parse().unwrap()));
    }

    #[test]
    fn test_mixed_entries() {
        let filter = AddressFilter::parse(["192.168.1.1", "10.0.0.0/24"]).unwrap();
        assert!(filter.admits("192.168.1.1".parse().unwrap()));
        assert!(filter.admits("10.0.0.42".parse().unwrap()));
        assert!(!filter.admits("172.16.0.1".parse().unwrap()));
    }

    #[test]
    fn test_invalid_entry_rejected() {
        let err = AddressFilter::parse(["not-an-address"]).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { ref text } if text == "not-an-address"));

        assert!(AddressFilter::parse(["10.0.0.0/33"]).is_err());
    }

    #[test]
    fn test_empty_filter_admits_nothing() {
        let filter = AddressFilter::parse(Vec::<&str>::new()).unwrap();
        assert!(!filter.admits("10.0.0.1".parse().unwrap()));
    }

    /// Sweep a /24 and its surroundings, comparing against reference mask
    /// arithmetic on the raw u32 representation.
    #[test]
    fn test_containment_matches_reference_mask_logic() {
        let filter = AddressFilter::parse(["10.0.0.0/24", "10.0.5.7"]).unwrap();

        let base: u32 = u32::from(Ipv4Addr::new(10, 0, 0, 0));
        let mask: u32 = !0u32 << 8;
        let singleton = Ipv4Addr::new(10, 0, 5, 7);

        for offset in 0u32..2048 {
            let candidate = Ipv4Addr::from(base.wrapping_add(offset));
            let expected =
                (u32::from(candidate) & mask) == (base & mask) || candidate == singleton;
            assert_eq!(
                filter.admits(candidate),
                expected,
                "divergence at {candidate}"
            );
        }
    }
}
