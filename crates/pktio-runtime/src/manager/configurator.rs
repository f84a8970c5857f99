//! Per-port configuration: offload negotiation and queue provisioning.

use super::types::{PortFailure, PortOutcome, PortStage};
use crate::config::PortRingConfig;
use crate::{debug_log, info_log, warn_log};
use pktio_hal::{
    DeviceInfo, EthDevApi, PoolHandle, PortConf, PortId, RssHashFunctions, RxMqMode, RxOffloads,
    TxMqMode, TxOffloads,
};

/// Queues requested per direction.
pub const QUEUES_PER_PORT: u16 = 1;

/// Configuration every port is asked for before negotiation.
///
/// RSS over IP, TCP and UDP on receive, checksum offloads in both directions.
pub fn default_port_conf() -> PortConf {
    PortConf {
        rx_mq_mode: RxMqMode::Rss,
        rx_offloads: RxOffloads::CHECKSUM,
        rss_key: None,
        rss_hf: RssHashFunctions::IP | RssHashFunctions::TCP | RssHashFunctions::UDP,
        tx_mq_mode: TxMqMode::None,
        tx_offloads: TxOffloads::CHECKSUM,
    }
}

/// Narrows `template` to what the device advertises.
///
/// Offloads and hash functions are intersected with the device's
/// capabilities. RSS is dropped entirely when no hash function survives.
pub fn negotiate(template: &PortConf, info: &DeviceInfo) -> PortConf {
    let mut conf = template.clone();
    conf.rx_offloads &= info.rx_offload_capa;
    conf.tx_offloads &= info.tx_offload_capa;
    conf.rss_hf &= info.flow_type_rss_offloads;

    if conf.rx_mq_mode == RxMqMode::Rss && conf.rss_hf.is_empty() {
        conf.rx_mq_mode = RxMqMode::None;
    }
    conf
}

/// Configures one port and provisions its queue pair.
///
/// Never fails: a failing step is recorded in the returned outcome and the
/// port is reported as skipped.
pub fn configure_port<H: EthDevApi + ?Sized>(
    hal: &H,
    port: PortId,
    rings: &PortRingConfig,
    pool: PoolHandle,
) -> PortOutcome {
    match try_configure_port(hal, port, rings, pool) {
        Ok(conf) => {
            info_log!(
                "PortConfigurator",
                port = %port,
                rx_offloads = %conf.rx_offloads,
                tx_offloads = %conf.tx_offloads,
                rss_hf = %conf.rss_hf,
                "Port configured"
            );
            PortOutcome::completed(port)
        }
        Err(failure) => {
            warn_log!(
                "PortConfigurator",
                port = %port,
                stage = %failure.stage,
                error = %failure.error,
                "Skipping port"
            );
            PortOutcome::skipped(port, failure)
        }
    }
}

fn try_configure_port<H: EthDevApi + ?Sized>(
    hal: &H,
    port: PortId,
    rings: &PortRingConfig,
    pool: PoolHandle,
) -> Result<PortConf, PortFailure> {
    let info = hal
        .dev_info(port)
        .map_err(|e| PortFailure::new(PortStage::DevInfo, e))?;

    let template = default_port_conf();
    let conf = negotiate(&template, &info);
    if conf != template {
        debug_log!(
            "PortConfigurator",
            port = %port,
            driver = %info.driver_name,
            requested_rx = %template.rx_offloads,
            applied_rx = %conf.rx_offloads,
            requested_tx = %template.tx_offloads,
            applied_tx = %conf.tx_offloads,
            "Device does not support the full offload template"
        );
    }

    hal.dev_configure(port, QUEUES_PER_PORT, QUEUES_PER_PORT, &conf)
        .map_err(|e| PortFailure::new(PortStage::Configure, e))?;

    let socket = hal.port_socket_id(port);
    hal.rx_queue_setup(port, 0, rings.rx_ring_size, socket, pool)
        .map_err(|e| PortFailure::new(PortStage::RxQueueSetup, e))?;
    hal.tx_queue_setup(port, 0, rings.tx_ring_size, socket)
        .map_err(|e| PortFailure::new(PortStage::TxQueueSetup, e))?;

    Ok(conf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pktio_hal::{
        EnvApi, Fault, HalCall, MempoolApi, PoolSpec, SimHal, SimPort, SocketId,
    };
    use pretty_assertions::assert_eq;

    fn full_info() -> DeviceInfo {
        DeviceInfo {
            driver_name: "net_sim".to_string(),
            rx_offload_capa: RxOffloads::CHECKSUM | RxOffloads::VLAN_STRIP,
            tx_offload_capa: TxOffloads::CHECKSUM | TxOffloads::TCP_TSO,
            flow_type_rss_offloads: RssHashFunctions::IP
                | RssHashFunctions::TCP
                | RssHashFunctions::UDP,
            ..DeviceInfo::default()
        }
    }

    fn setup(port: SimPort) -> (SimHal, PoolHandle) {
        let hal = SimHal::builder().port(port).build();
        hal.env_init(&["app".to_string()]).unwrap();
        let pool = hal
            .pool_create(&PoolSpec {
                name: "MBUF_POOL".to_string(),
                capacity: 512,
                cache_size: 0,
                priv_size: 0,
                data_room_size: 2176,
                socket: SocketId::new(0),
            })
            .unwrap();
        hal.clear_calls();
        (hal, pool)
    }

    #[test]
    fn test_full_capabilities_keep_template() {
        assert_eq!(negotiate(&default_port_conf(), &full_info()), default_port_conf());
    }

    #[test]
    fn test_offloads_intersected() {
        let info = DeviceInfo {
            rx_offload_capa: RxOffloads::IPV4_CKSUM,
            tx_offload_capa: TxOffloads::empty(),
            ..full_info()
        };
        let template = PortConf {
            rx_offloads: RxOffloads::IPV4_CKSUM | RxOffloads::TCP_CKSUM,
            ..default_port_conf()
        };

        let conf = negotiate(&template, &info);
        assert_eq!(conf.rx_offloads, RxOffloads::IPV4_CKSUM);
        assert!(conf.tx_offloads.is_empty());
        assert_eq!(conf.rx_mq_mode, RxMqMode::Rss);
    }

    #[test]
    fn test_rss_dropped_without_hash_support() {
        let info = DeviceInfo {
            flow_type_rss_offloads: RssHashFunctions::empty(),
            ..full_info()
        };

        let conf = negotiate(&default_port_conf(), &info);
        assert_eq!(conf.rx_mq_mode, RxMqMode::None);
        assert!(conf.rss_hf.is_empty());
    }

    #[test]
    fn test_rss_partially_supported() {
        let info = DeviceInfo {
            flow_type_rss_offloads: RssHashFunctions::IPV4 | RssHashFunctions::NONFRAG_IPV4_UDP,
            ..full_info()
        };

        let conf = negotiate(&default_port_conf(), &info);
        assert_eq!(conf.rx_mq_mode, RxMqMode::Rss);
        assert_eq!(
            conf.rss_hf,
            RssHashFunctions::IPV4 | RssHashFunctions::NONFRAG_IPV4_UDP
        );
    }

    #[test]
    fn test_configure_port_call_sequence() {
        let (hal, pool) = setup(SimPort::new("net_sim").socket(SocketId::new(1)));
        let port = PortId::new(0);
        let rings = PortRingConfig {
            rx_ring_size: 512,
            tx_ring_size: 256,
        };

        let outcome = configure_port(&hal, port, &rings, pool);
        assert!(outcome.is_clean());

        let calls = hal.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], HalCall::DevInfo(port));
        assert!(matches!(
            calls[1],
            HalCall::DevConfigure { nb_rx: 1, nb_tx: 1, .. }
        ));
        assert_eq!(
            calls[2],
            HalCall::RxQueueSetup {
                port,
                queue: 0,
                nb_desc: 512,
                socket: SocketId::new(1),
            }
        );
        assert_eq!(
            calls[3],
            HalCall::TxQueueSetup {
                port,
                queue: 0,
                nb_desc: 256,
                socket: SocketId::new(1),
            }
        );

        let state = hal.port_state(port).unwrap();
        assert_eq!(state.rx_pool, Some(pool));
    }

    #[test]
    fn test_configure_port_applies_negotiated_conf() {
        let (hal, pool) = setup(
            SimPort::new("net_sim")
                .rx_offloads(RxOffloads::IPV4_CKSUM)
                .tx_offloads(TxOffloads::empty())
                .rss(RssHashFunctions::empty()),
        );
        let port = PortId::new(0);

        assert!(configure_port(&hal, port, &PortRingConfig::default(), pool).is_clean());

        let applied = hal.port_state(port).unwrap().conf.unwrap();
        assert_eq!(applied.rx_offloads, RxOffloads::IPV4_CKSUM);
        assert!(applied.tx_offloads.is_empty());
        assert_eq!(applied.rx_mq_mode, RxMqMode::None);
    }

    #[test]
    fn test_dev_info_failure_skips_port() {
        let (hal, pool) = setup(SimPort::new("net_sim"));
        let port = PortId::new(0);
        hal.inject(Fault::DevInfo(port));

        let outcome = configure_port(&hal, port, &PortRingConfig::default(), pool);
        assert!(!outcome.completed);
        assert_eq!(outcome.failures[0].stage, PortStage::DevInfo);
        assert_eq!(hal.calls(), vec![HalCall::DevInfo(port)]);
    }

    #[test]
    fn test_oversized_ring_skips_port() {
        let (hal, pool) = setup(SimPort::new("net_sim").max_ring_size(512));
        let port = PortId::new(0);

        let outcome = configure_port(&hal, port, &PortRingConfig::default(), pool);
        assert!(!outcome.completed);
        assert_eq!(outcome.failures[0].stage, PortStage::RxQueueSetup);
    }
}
