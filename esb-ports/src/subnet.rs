use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

/// An IPv4 CIDR block such as `172.50.0.0/16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Subnet {
    pub network: Ipv4Addr,
    pub prefix: u8,
}

impl Subnet {
    /// `172.{index}.0.0/16`, the shape of every subnet esb allocates.
    pub fn private_b(index: u8) -> Self {
        Subnet {
            network: Ipv4Addr::new(172, index, 0, 0),
            prefix: 16,
        }
    }

    /// The `n`th address inside the block.
    pub fn host(&self, n: u32) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network).wrapping_add(n))
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}
