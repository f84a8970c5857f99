//! Integration tests for the resource manager against the simulated layer
//!
//! These tests drive full bring-up, port passes and teardown through
//! `SimHal`, asserting on the calls the manager issues and the state the
//! device model ends up in.

use pktio_hal::{
    Fault, HalCall, HalStatus, PortId, PortStats, RssHashFunctions, RxMqMode, RxOffloads, SimHal,
    SimPort, SocketId, TxOffloads,
};
use pktio_runtime::{PortStage, ResourceManager, RuntimeConfig, RuntimeError};
use std::sync::Arc;

fn sim(ports: usize) -> Arc<SimHal> {
    Arc::new(SimHal::builder().ports(ports, SimPort::new("net_sim")).build())
}

fn manager(hal: &Arc<SimHal>) -> ResourceManager<SimHal> {
    ResourceManager::new(Arc::clone(hal))
}

fn count_calls(hal: &SimHal, pred: impl Fn(&HalCall) -> bool) -> usize {
    hal.calls().iter().filter(|c| pred(c)).count()
}

mod initialize {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_initialize_twice_is_idempotent() {
        let hal = sim(2);
        let mut m = manager(&hal);

        m.initialize(RuntimeConfig::default()).unwrap();
        let calls_after_first = hal.calls().len();

        let mut other = RuntimeConfig::default();
        other.pool.name = "OTHER".to_string();
        m.initialize(other).unwrap();

        assert_eq!(hal.calls().len(), calls_after_first);
        assert_eq!(hal.env_init_count(), 1);
        assert_eq!(m.config().unwrap().pool.name, "MBUF_POOL");
        assert_eq!(m.stats().initializations, 1);
    }

    #[test]
    fn test_bootstrap_failure_leaves_nothing() {
        let hal = sim(2);
        hal.inject(Fault::EnvInit);
        let mut m = manager(&hal);

        let err = m.initialize(RuntimeConfig::default()).unwrap_err();
        assert!(matches!(err, RuntimeError::Bootstrap(_)));
        assert!(!m.is_initialized());
        assert!(m.pool().is_none());
        assert_eq!(m.port_count(), 0);
        assert_eq!(
            count_calls(&hal, |c| matches!(c, HalCall::PoolCreate { .. })),
            0
        );
    }

    #[test]
    fn test_pool_failure_tears_down_environment() {
        let hal = sim(2);
        hal.inject(Fault::PoolCreate);
        let mut m = manager(&hal);

        let err = m.initialize(RuntimeConfig::default()).unwrap_err();
        assert!(matches!(err, RuntimeError::PoolCreate(_)));
        assert_eq!(
            err.hal_error().and_then(|e| e.hal_status()),
            Some(HalStatus::NoMemory)
        );
        assert!(!m.is_initialized());
        assert!(!hal.is_env_up());
        assert_eq!(hal.calls().last(), Some(&HalCall::EnvCleanup));
    }

    #[test]
    fn test_discovery_failure_rolls_back_in_reverse_order() {
        let hal = sim(2);
        hal.inject(Fault::PortEnumeration);
        let mut m = manager(&hal);

        let err = m.initialize(RuntimeConfig::default()).unwrap_err();
        assert!(matches!(err, RuntimeError::Discovery(_)));
        assert!(!hal.is_env_up());
        assert!(hal.pool_names().is_empty());

        let calls = hal.calls();
        let tail = &calls[calls.len() - 2..];
        assert!(matches!(tail[0], HalCall::PoolFree(_)));
        assert_eq!(tail[1], HalCall::EnvCleanup);
    }

    #[test]
    fn test_retry_after_failure() {
        let hal = sim(1);
        hal.inject(Fault::PoolCreate);
        let mut m = manager(&hal);

        assert!(m.initialize(RuntimeConfig::default()).is_err());
        hal.heal(Fault::PoolCreate);
        assert!(m.initialize(RuntimeConfig::default()).is_ok());

        assert_eq!(m.stats().failed_initializations, 1);
        assert_eq!(m.stats().initializations, 1);
        assert_eq!(hal.env_init_count(), 2);
    }

    #[test]
    fn test_zero_ports_is_valid() {
        let hal = sim(0);
        let mut m = manager(&hal);

        m.initialize(RuntimeConfig::default()).unwrap();
        assert!(m.is_initialized());
        assert_eq!(m.port_count(), 0);
        assert!(matches!(
            m.port_id(0),
            Err(RuntimeError::IndexOutOfRange { index: 0, count: 0 })
        ));
        assert!(m.configure_ports().unwrap().is_empty());
        assert!(m.start_ports().unwrap().is_empty());
    }

    #[test]
    fn test_port_lookup_out_of_range() {
        let hal = sim(2);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();

        assert_eq!(m.port_id(0).unwrap(), PortId::new(0));
        assert!(matches!(
            m.port_id(2),
            Err(RuntimeError::IndexOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_pool_capacity_independent_of_ports() {
        let hal = Arc::new(
            SimHal::builder()
                .ports(4, SimPort::new("net_sim"))
                .socket(SocketId::new(1))
                .build(),
        );
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();

        let spec = hal.pool_spec(m.pool().unwrap()).unwrap();
        assert_eq!(spec.capacity, 8192);
        assert_eq!(spec.socket, SocketId::new(1));
    }
}

mod ports {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_configure_and_start_before_initialize() {
        let hal = sim(2);
        let mut m = manager(&hal);

        assert!(matches!(
            m.configure_ports(),
            Err(RuntimeError::NotInitialized)
        ));
        assert!(matches!(m.start_ports(), Err(RuntimeError::NotInitialized)));
        assert!(hal.calls().is_empty());
    }

    #[test]
    fn test_full_lifecycle() {
        let hal = sim(2);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();

        assert!(m.configure_ports().unwrap().all_succeeded());
        assert!(m.start_ports().unwrap().all_succeeded());
        for port in m.port_ids() {
            let state = hal.port_state(*port).unwrap();
            assert!(state.started);
            assert!(state.promiscuous);
            assert_eq!(state.rx_ring_size, Some(1024));
            assert_eq!(state.tx_ring_size, Some(1024));
        }

        let stopped = m.stop_ports();
        assert_eq!(stopped.succeeded(), vec![PortId::new(0), PortId::new(1)]);

        m.cleanup();
        assert!(!m.is_initialized());
        assert!(!hal.is_env_up());
        assert_eq!(m.stats().ports_configured, 2);
        assert_eq!(m.stats().ports_started, 2);
    }

    #[test]
    fn test_offloads_negotiated_per_port() {
        let hal = Arc::new(
            SimHal::builder()
                .port(SimPort::new("full"))
                .port(
                    SimPort::new("basic")
                        .rx_offloads(RxOffloads::IPV4_CKSUM)
                        .tx_offloads(TxOffloads::empty())
                        .rss(RssHashFunctions::empty()),
                )
                .build(),
        );
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();
        assert!(m.configure_ports().unwrap().all_succeeded());

        let full = hal.port_state(PortId::new(0)).unwrap().conf.unwrap();
        assert_eq!(full.rx_offloads, RxOffloads::CHECKSUM);
        assert_eq!(full.tx_offloads, TxOffloads::CHECKSUM);
        assert_eq!(full.rx_mq_mode, RxMqMode::Rss);

        let basic = hal.port_state(PortId::new(1)).unwrap().conf.unwrap();
        assert_eq!(basic.rx_offloads, RxOffloads::IPV4_CKSUM);
        assert!(basic.tx_offloads.is_empty());
        assert_eq!(basic.rx_mq_mode, RxMqMode::None);
    }

    #[test]
    fn test_queue_setup_failure_skips_only_that_port() {
        let hal = sim(2);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();
        hal.inject(Fault::RxQueueSetup(PortId::new(1)));

        let report = m.configure_ports().unwrap();
        assert!(!report.all_succeeded());
        assert_eq!(report.succeeded(), vec![PortId::new(0)]);
        assert_eq!(report.skipped(), vec![PortId::new(1)]);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, PortId::new(1));
        assert_eq!(failures[0].1.stage, PortStage::RxQueueSetup);

        let p0 = hal.port_state(PortId::new(0)).unwrap();
        assert!(p0.configured);
        assert_eq!(p0.rx_queues, vec![true]);
        assert_eq!(p0.tx_queues, vec![true]);

        let p1 = hal.port_state(PortId::new(1)).unwrap();
        assert_eq!(p1.rx_queues, vec![false]);
        assert_eq!(
            count_calls(&hal, |c| matches!(
                c,
                HalCall::TxQueueSetup { port, .. } if *port == PortId::new(1)
            )),
            0
        );
    }

    #[test]
    fn test_start_continues_past_failed_port() {
        let hal = sim(3);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();
        m.configure_ports().unwrap();
        hal.inject(Fault::DevStart(PortId::new(0)));
        hal.inject(Fault::Promiscuous(PortId::new(2)));

        let report = m.start_ports().unwrap();
        assert_eq!(report.skipped(), vec![PortId::new(0)]);
        assert_eq!(report.degraded(), vec![PortId::new(2)]);
        assert!(report.outcome(PortId::new(1)).unwrap().is_clean());
        assert!(hal.port_state(PortId::new(2)).unwrap().started);
    }

    #[test]
    fn test_unconfigured_ports_fail_to_start() {
        let hal = sim(1);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();

        let report = m.start_ports().unwrap();
        assert_eq!(report.skipped(), vec![PortId::new(0)]);
    }

    #[test]
    fn test_stop_without_start_is_safe() {
        let hal = sim(2);
        let mut m = manager(&hal);

        assert!(m.stop_ports().is_empty());

        m.initialize(RuntimeConfig::default()).unwrap();
        m.configure_ports().unwrap();
        let report = m.stop_ports();
        assert_eq!(report.len(), 2);
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_stop_failure_still_closes() {
        let hal = sim(2);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();
        m.configure_ports().unwrap();
        hal.inject(Fault::DevStop(PortId::new(0)));

        let report = m.stop_ports();
        assert_eq!(report.len(), 2);
        assert_eq!(
            report.outcome(PortId::new(0)).unwrap().failures[0].stage,
            PortStage::Stop
        );
        assert_eq!(
            count_calls(&hal, |c| matches!(c, HalCall::DevClose(_))),
            2
        );
    }

    #[test]
    fn test_cleanup_stops_running_ports() {
        let hal = sim(2);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();
        m.configure_ports().unwrap();
        m.start_ports().unwrap();
        hal.clear_calls();

        m.cleanup();
        let calls = hal.calls();
        assert_eq!(calls[0], HalCall::DevStop(PortId::new(0)));
        assert_eq!(calls[1], HalCall::DevClose(PortId::new(0)));
        assert_eq!(calls[2], HalCall::DevStop(PortId::new(1)));
        assert_eq!(calls[3], HalCall::DevClose(PortId::new(1)));
        assert!(matches!(calls[4], HalCall::PoolFree(_)));
        assert_eq!(calls[5], HalCall::EnvCleanup);
        assert_eq!(m.port_count(), 0);
        assert!(m.pool().is_none());
    }

    #[test]
    fn test_reinitialize_after_cleanup() {
        let hal = sim(2);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();
        m.configure_ports().unwrap();
        m.start_ports().unwrap();
        m.cleanup();

        m.initialize(RuntimeConfig::default()).unwrap();
        assert_eq!(m.port_count(), 2);
        assert!(m.configure_ports().unwrap().all_succeeded());
        assert!(m.start_ports().unwrap().all_succeeded());
    }

    #[test]
    fn test_second_stop_leaves_closed_ports_alone() {
        let hal = sim(2);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();
        m.configure_ports().unwrap();
        m.start_ports().unwrap();

        assert!(m.stop_ports().all_succeeded());
        hal.clear_calls();

        let again = m.stop_ports();
        assert!(again.is_empty());
        assert!(again.skipped().is_empty());
        assert!(hal.calls().is_empty());
        assert_eq!(m.stats().ports_stopped, 2);
    }

    #[test]
    fn test_cleanup_after_stop_only_releases_resources() {
        let hal = sim(2);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();
        m.configure_ports().unwrap();
        m.start_ports().unwrap();
        m.stop_ports();
        hal.clear_calls();

        m.cleanup();
        let calls = hal.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], HalCall::PoolFree(_)));
        assert_eq!(calls[1], HalCall::EnvCleanup);
        assert!(!hal.is_env_up());
    }

    #[test]
    fn test_ports_stop_again_after_reinitialize() {
        let hal = sim(1);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();
        m.configure_ports().unwrap();
        m.start_ports().unwrap();
        m.stop_ports();
        m.cleanup();

        m.initialize(RuntimeConfig::default()).unwrap();
        m.configure_ports().unwrap();
        m.start_ports().unwrap();
        hal.clear_calls();

        let stopped = m.stop_ports();
        assert_eq!(stopped.succeeded(), vec![PortId::new(0)]);
        assert_eq!(
            hal.calls(),
            vec![
                HalCall::DevStop(PortId::new(0)),
                HalCall::DevClose(PortId::new(0))
            ]
        );
    }
}

mod stats {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_all_stats_in_discovery_order() {
        let hal = sim(2);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();

        let counters = PortStats {
            ipackets: 100,
            opackets: 90,
            ibytes: 6400,
            obytes: 5760,
            ierrors: 1,
            imissed: 3,
            ..PortStats::default()
        };
        hal.set_stats(PortId::new(1), counters);

        assert_eq!(
            m.report_all_stats(),
            vec![
                (PortId::new(0), PortStats::default()),
                (PortId::new(1), counters),
            ]
        );
    }

    #[test]
    fn test_stats_failure_reports_nothing() {
        let hal = sim(1);
        let mut m = manager(&hal);
        m.initialize(RuntimeConfig::default()).unwrap();
        hal.inject(Fault::Stats(PortId::new(0)));

        assert!(m.port_stats(PortId::new(0)).is_none());
        assert!(m.report_all_stats().is_empty());
    }

    #[test]
    fn test_stats_before_initialize() {
        let hal = sim(1);
        let m = manager(&hal);
        assert!(m.report_all_stats().is_empty());
        assert!(m.port_stats(PortId::new(0)).is_none());
    }
}

mod config {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_configured_rings_reach_queues() {
        let hal = sim(1);
        let mut m = manager(&hal);
        let config = RuntimeConfig::from_toml_str(
            r#"
[ports]
rx_ring_size = 512
tx_ring_size = 256

[environment]
args = ["pktio-test", "--no-huge"]
"#,
        )
        .unwrap();

        m.initialize(config).unwrap();
        m.configure_ports().unwrap();

        let state = hal.port_state(PortId::new(0)).unwrap();
        assert_eq!(state.rx_ring_size, Some(512));
        assert_eq!(state.tx_ring_size, Some(256));
        assert_eq!(
            hal.calls()[0],
            HalCall::EnvInit {
                args: vec!["pktio-test".to_string(), "--no-huge".to_string()]
            }
        );
    }

    #[test]
    fn test_invalid_config_makes_no_calls() {
        let hal = sim(1);
        let mut m = manager(&hal);
        let mut config = RuntimeConfig::default();
        config.ports.rx_ring_size = 0;

        assert!(matches!(
            m.initialize(config),
            Err(RuntimeError::Configuration(_))
        ));
        assert!(hal.calls().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pktio.toml");
        std::fs::write(&path, "[pool]\nname = \"RX\"\ncapacity = 1024\n").unwrap();

        let config = RuntimeConfig::load_or_default(&path).unwrap();
        let hal = sim(1);
        let mut m = manager(&hal);
        m.initialize(config).unwrap();

        assert_eq!(hal.pool_names(), vec!["RX".to_string()]);
    }
}
