//! Identifiers, capability bitmasks and value types exchanged with the layer.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// Hardware-assigned port identifier.
///
/// Stable for the lifetime of the process once the layer has reported it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PortId(u16);

impl PortId {
    /// Creates a port identifier from its raw value.
    pub const fn new(raw: u16) -> Self {
        PortId(raw)
    }

    /// Returns the raw identifier.
    pub const fn as_raw(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NUMA socket identifier as reported by the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SocketId(i32);

impl SocketId {
    /// Any socket; used when the layer cannot determine affinity.
    pub const ANY: Self = SocketId(-1);

    pub const fn new(raw: i32) -> Self {
        SocketId(raw)
    }

    pub const fn as_raw(&self) -> i32 {
        self.0
    }

    /// Returns true if this names a concrete socket.
    pub const fn is_specific(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_specific() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "any")
        }
    }
}

/// Opaque handle to a packet buffer pool created by the layer.
///
/// A handle is never null; the layer signals allocation failure through an
/// error instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle(u64);

impl PoolHandle {
    /// Creates a handle from a raw value.
    ///
    /// Returns `None` if the raw value is 0 (null handle).
    pub fn from_raw(raw: u64) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(PoolHandle(raw))
        }
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pool(0x{:016x})", self.0)
    }
}

impl fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

// ============================================================================
// Capability bitmasks
// ============================================================================

macro_rules! define_flags {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$fmeta:meta])* $flag:ident = $bit:expr, $label:literal;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(u64);

        impl $name {
            $($(#[$fmeta])* pub const $flag: Self = $name($bit);)*

            const NAMED: &'static [(u64, &'static str)] = &[$(($bit, $label)),*];

            /// The empty set.
            pub const fn empty() -> Self {
                $name(0)
            }

            pub const fn is_empty(&self) -> bool {
                self.0 == 0
            }

            /// Returns true if every flag in `other` is also set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Flags set in both `self` and `other`.
            pub const fn intersection(self, other: Self) -> Self {
                $name(self.0 & other.0)
            }

            pub const fn union(self, other: Self) -> Self {
                $name(self.0 | other.0)
            }

            /// Names of the known flags that are set.
            pub fn names(&self) -> Vec<&'static str> {
                Self::NAMED
                    .iter()
                    .filter(|(bit, _)| self.0 & bit == *bit)
                    .map(|(_, label)| *label)
                    .collect()
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                self.intersection(rhs)
            }
        }

        impl BitAndAssign for $name {
            fn bitand_assign(&mut self, rhs: Self) {
                self.0 &= rhs.0;
            }
        }

        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x}: {:?})", stringify!($name), self.0, self.names())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_empty() {
                    write!(f, "none")
                } else {
                    write!(f, "{}", self.names().join("|"))
                }
            }
        }
    };
}

define_flags! {
    /// Receive offloads a port supports or is asked to enable.
    RxOffloads {
        VLAN_STRIP = 1 << 0, "vlan_strip";
        IPV4_CKSUM = 1 << 1, "ipv4_cksum";
        UDP_CKSUM = 1 << 2, "udp_cksum";
        TCP_CKSUM = 1 << 3, "tcp_cksum";
        TCP_LRO = 1 << 4, "tcp_lro";
        SCATTER = 1 << 13, "scatter";
        RSS_HASH = 1 << 19, "rss_hash";
    }
}

impl RxOffloads {
    /// IPv4, UDP and TCP checksum validation.
    pub const CHECKSUM: Self =
        RxOffloads(Self::IPV4_CKSUM.0 | Self::UDP_CKSUM.0 | Self::TCP_CKSUM.0);
}

define_flags! {
    /// Transmit offloads a port supports or is asked to enable.
    TxOffloads {
        VLAN_INSERT = 1 << 0, "vlan_insert";
        IPV4_CKSUM = 1 << 1, "ipv4_cksum";
        UDP_CKSUM = 1 << 2, "udp_cksum";
        TCP_CKSUM = 1 << 3, "tcp_cksum";
        SCTP_CKSUM = 1 << 4, "sctp_cksum";
        TCP_TSO = 1 << 5, "tcp_tso";
        MULTI_SEGS = 1 << 15, "multi_segs";
    }
}

impl TxOffloads {
    /// IPv4, UDP and TCP checksum insertion.
    pub const CHECKSUM: Self =
        TxOffloads(Self::IPV4_CKSUM.0 | Self::UDP_CKSUM.0 | Self::TCP_CKSUM.0);
}

define_flags! {
    /// Packet fields an RSS hash can be computed over.
    RssHashFunctions {
        IPV4 = 1 << 2, "ipv4";
        NONFRAG_IPV4_TCP = 1 << 4, "ipv4_tcp";
        NONFRAG_IPV4_UDP = 1 << 5, "ipv4_udp";
        IPV6 = 1 << 8, "ipv6";
        NONFRAG_IPV6_TCP = 1 << 10, "ipv6_tcp";
        NONFRAG_IPV6_UDP = 1 << 11, "ipv6_udp";
    }
}

impl RssHashFunctions {
    pub const IP: Self = RssHashFunctions(Self::IPV4.0 | Self::IPV6.0);
    pub const TCP: Self =
        RssHashFunctions(Self::NONFRAG_IPV4_TCP.0 | Self::NONFRAG_IPV6_TCP.0);
    pub const UDP: Self =
        RssHashFunctions(Self::NONFRAG_IPV4_UDP.0 | Self::NONFRAG_IPV6_UDP.0);
}

// ============================================================================
// Device description and configuration
// ============================================================================

/// Driver-reported device information for one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Name of the poll-mode driver bound to the port.
    pub driver_name: String,
    pub rx_offload_capa: RxOffloads,
    pub tx_offload_capa: TxOffloads,
    /// Hash functions usable for receive-side scaling.
    pub flow_type_rss_offloads: RssHashFunctions,
    pub max_rx_queues: u16,
    pub max_tx_queues: u16,
    /// Largest ring the driver accepts for a single queue.
    pub max_ring_size: u16,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            driver_name: String::new(),
            rx_offload_capa: RxOffloads::empty(),
            tx_offload_capa: TxOffloads::empty(),
            flow_type_rss_offloads: RssHashFunctions::empty(),
            max_rx_queues: 1,
            max_tx_queues: 1,
            max_ring_size: 4096,
        }
    }
}

/// Receive multi-queue mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RxMqMode {
    #[default]
    None,
    /// Receive-side scaling across queues by packet hash.
    Rss,
}

/// Transmit multi-queue mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TxMqMode {
    #[default]
    None,
}

/// Port-level configuration applied before queues are provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortConf {
    pub rx_mq_mode: RxMqMode,
    pub rx_offloads: RxOffloads,
    /// RSS key; `None` lets the driver pick its default key.
    pub rss_key: Option<Vec<u8>>,
    pub rss_hf: RssHashFunctions,
    pub tx_mq_mode: TxMqMode,
    pub tx_offloads: TxOffloads,
}

/// Hardware traffic counters for one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortStats {
    /// Packets received.
    pub ipackets: u64,
    /// Packets transmitted.
    pub opackets: u64,
    /// Bytes received.
    pub ibytes: u64,
    /// Bytes transmitted.
    pub obytes: u64,
    /// Receive errors.
    pub ierrors: u64,
    /// Transmit errors.
    pub oerrors: u64,
    /// Packets dropped by the hardware because no receive descriptor was free.
    pub imissed: u64,
    /// Receive buffer allocation failures.
    pub rx_nombuf: u64,
}
