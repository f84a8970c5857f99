//! In-process device model of the layer.
//!
//! [`SimHal`] keeps enough state to enforce the ordering rules real drivers
//! enforce (configure before queue setup, queue setup before start, stop
//! before close) and lets tests inject a failure at any call. Every call is
//! recorded in a journal so tests can assert on the exact sequence issued.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use parking_lot::Mutex;

use crate::api::{EnvApi, EthDevApi, MempoolApi, PoolSpec};
use crate::error::{HalError, HalResult, HalStatus};
use crate::types::{
    DeviceInfo, PoolHandle, PortConf, PortId, PortStats, RssHashFunctions, RxOffloads, SocketId,
    TxOffloads,
};

/// A call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    EnvInit,
    EnvCleanup,
    PoolCreate,
    PortEnumeration,
    DevInfo(PortId),
    DevConfigure(PortId),
    RxQueueSetup(PortId),
    TxQueueSetup(PortId),
    DevStart(PortId),
    DevStop(PortId),
    DevClose(PortId),
    Promiscuous(PortId),
    Stats(PortId),
}

impl Fault {
    fn default_status(&self) -> HalStatus {
        match self {
            Fault::PoolCreate => HalStatus::NoMemory,
            Fault::DevInfo(_) => HalStatus::NotSupported,
            _ => HalStatus::Io,
        }
    }
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HalCall {
    EnvInit { args: Vec<String> },
    EnvCleanup,
    PoolCreate { name: String, socket: SocketId },
    PoolFree(PoolHandle),
    PortIds,
    DevInfo(PortId),
    DevConfigure {
        port: PortId,
        nb_rx: u16,
        nb_tx: u16,
        conf: PortConf,
    },
    RxQueueSetup {
        port: PortId,
        queue: u16,
        nb_desc: u16,
        socket: SocketId,
    },
    TxQueueSetup {
        port: PortId,
        queue: u16,
        nb_desc: u16,
        socket: SocketId,
    },
    DevStart(PortId),
    DevStop(PortId),
    DevClose(PortId),
    Promiscuous(PortId),
    StatsGet(PortId),
}

/// Description of one simulated port.
#[derive(Debug, Clone)]
pub struct SimPort {
    id: Option<PortId>,
    info: DeviceInfo,
    socket: SocketId,
    stats: PortStats,
}

impl SimPort {
    /// A port with checksum offloads, IP/TCP/UDP hashing and one queue pair
    /// on socket 0.
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            id: None,
            info: DeviceInfo {
                driver_name: driver.into(),
                rx_offload_capa: RxOffloads::CHECKSUM | RxOffloads::VLAN_STRIP,
                tx_offload_capa: TxOffloads::CHECKSUM | TxOffloads::VLAN_INSERT,
                flow_type_rss_offloads: RssHashFunctions::IP
                    | RssHashFunctions::TCP
                    | RssHashFunctions::UDP,
                ..DeviceInfo::default()
            },
            socket: SocketId::new(0),
            stats: PortStats::default(),
        }
    }

    /// Gives the port an explicit identifier instead of the next free one.
    pub fn id(mut self, id: PortId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn rx_offloads(mut self, capa: RxOffloads) -> Self {
        self.info.rx_offload_capa = capa;
        self
    }

    pub fn tx_offloads(mut self, capa: TxOffloads) -> Self {
        self.info.tx_offload_capa = capa;
        self
    }

    pub fn rss(mut self, capa: RssHashFunctions) -> Self {
        self.info.flow_type_rss_offloads = capa;
        self
    }

    pub fn max_ring_size(mut self, size: u16) -> Self {
        self.info.max_ring_size = size;
        self
    }

    pub fn socket(mut self, socket: SocketId) -> Self {
        self.socket = socket;
        self
    }

    pub fn stats(mut self, stats: PortStats) -> Self {
        self.stats = stats;
        self
    }
}

/// Observable state of one simulated port.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimPortState {
    pub configured: bool,
    /// Configuration applied by the last successful configure call.
    pub conf: Option<PortConf>,
    /// Per-queue readiness, sized by the configured queue count.
    pub rx_queues: Vec<bool>,
    pub tx_queues: Vec<bool>,
    /// Ring depth and socket of the last receive queue set up.
    pub rx_ring_size: Option<u16>,
    pub tx_ring_size: Option<u16>,
    pub queue_socket: Option<SocketId>,
    /// Pool backing the receive queues.
    pub rx_pool: Option<PoolHandle>,
    pub started: bool,
    pub promiscuous: bool,
    pub closed: bool,
}

impl SimPortState {
    fn queues_ready(&self) -> bool {
        !self.rx_queues.is_empty()
            && !self.tx_queues.is_empty()
            && self.rx_queues.iter().all(|r| *r)
            && self.tx_queues.iter().all(|r| *r)
    }
}

struct PortEntry {
    id: PortId,
    info: DeviceInfo,
    socket: SocketId,
    stats: PortStats,
    state: SimPortState,
}

struct SimState {
    env_up: bool,
    env_init_count: u32,
    caller_socket: SocketId,
    reported_count: Option<u16>,
    ports: Vec<PortEntry>,
    pools: BTreeMap<u64, PoolSpec>,
    next_pool: u64,
    faults: HashMap<Fault, HalStatus>,
    calls: Vec<HalCall>,
}

impl SimState {
    fn check(&self, fault: Fault, op: &'static str) -> HalResult<()> {
        self.faults
            .get(&fault)
            .map_or(Ok(()), |status| status.into_result(op))
    }

    fn ensure_env(&self, op: &'static str) -> HalResult<()> {
        if self.env_up {
            Ok(())
        } else {
            Err(HalError::status(op, HalStatus::NotPermitted))
        }
    }

    fn port_mut(&mut self, port: PortId) -> HalResult<&mut PortEntry> {
        self.ports
            .iter_mut()
            .find(|p| p.id == port && !p.state.closed)
            .ok_or_else(|| HalError::no_such_port(port))
    }

    fn port(&self, port: PortId) -> HalResult<&PortEntry> {
        self.ports
            .iter()
            .find(|p| p.id == port && !p.state.closed)
            .ok_or_else(|| HalError::no_such_port(port))
    }
}

/// Builder for [`SimHal`].
pub struct SimHalBuilder {
    ports: Vec<SimPort>,
    socket: SocketId,
    reported_count: Option<u16>,
}

impl SimHalBuilder {
    pub fn port(mut self, port: SimPort) -> Self {
        self.ports.push(port);
        self
    }

    /// Adds `count` ports built from the same description.
    pub fn ports(mut self, count: usize, port: SimPort) -> Self {
        for _ in 0..count {
            self.ports.push(port.clone());
        }
        self
    }

    /// Socket of the calling thread.
    pub fn socket(mut self, socket: SocketId) -> Self {
        self.socket = socket;
        self
    }

    /// Makes the available-port count disagree with enumeration.
    pub fn reported_count(mut self, count: u16) -> Self {
        self.reported_count = Some(count);
        self
    }

    pub fn build(self) -> SimHal {
        let mut next_id: u16 = 0;
        let ports = self
            .ports
            .into_iter()
            .map(|p| {
                let id = p.id.unwrap_or(PortId::new(next_id));
                next_id = id.as_raw().saturating_add(1);
                PortEntry {
                    id,
                    info: p.info,
                    socket: p.socket,
                    stats: p.stats,
                    state: SimPortState::default(),
                }
            })
            .collect();

        SimHal {
            state: Mutex::new(SimState {
                env_up: false,
                env_init_count: 0,
                caller_socket: self.socket,
                reported_count: self.reported_count,
                ports,
                pools: BTreeMap::new(),
                next_pool: 0x1000,
                faults: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }
}

/// Simulated layer.
pub struct SimHal {
    state: Mutex<SimState>,
}

impl SimHal {
    pub fn builder() -> SimHalBuilder {
        SimHalBuilder {
            ports: Vec::new(),
            socket: SocketId::new(0),
            reported_count: None,
        }
    }

    /// Makes every future call matching `fault` fail with its default status.
    pub fn inject(&self, fault: Fault) {
        self.inject_status(fault, fault.default_status());
    }

    /// Makes every future call matching `fault` fail with `status`.
    pub fn inject_status(&self, fault: Fault, status: HalStatus) {
        self.state.lock().faults.insert(fault, status);
    }

    pub fn heal(&self, fault: Fault) {
        self.state.lock().faults.remove(&fault);
    }

    /// Calls recorded so far, oldest first.
    pub fn calls(&self) -> Vec<HalCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn port_state(&self, port: PortId) -> Option<SimPortState> {
        self.state
            .lock()
            .ports
            .iter()
            .find(|p| p.id == port)
            .map(|p| p.state.clone())
    }

    /// Replaces the counters a port reports.
    pub fn set_stats(&self, port: PortId, stats: PortStats) {
        if let Some(p) = self.state.lock().ports.iter_mut().find(|p| p.id == port) {
            p.stats = stats;
        }
    }

    pub fn is_env_up(&self) -> bool {
        self.state.lock().env_up
    }

    /// Number of successful environment initializations.
    pub fn env_init_count(&self) -> u32 {
        self.state.lock().env_init_count
    }

    /// Names of the pools currently allocated.
    pub fn pool_names(&self) -> Vec<String> {
        self.state
            .lock()
            .pools
            .values()
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn pool_spec(&self, pool: PoolHandle) -> Option<PoolSpec> {
        self.state.lock().pools.get(&pool.as_raw()).cloned()
    }
}

impl EnvApi for SimHal {
    fn env_init(&self, args: &[String]) -> HalResult<u32> {
        let mut st = self.state.lock();
        st.calls.push(HalCall::EnvInit {
            args: args.to_vec(),
        });
        st.check(Fault::EnvInit, "env_init")?;
        if st.env_up {
            return Err(HalError::status("env_init", HalStatus::Already));
        }
        if args.is_empty() {
            return Err(HalError::status("env_init", HalStatus::InvalidArgument));
        }

        st.env_up = true;
        st.env_init_count += 1;
        debug!("sim: environment up with {} args", args.len());
        Ok(u32::try_from(args.len()).unwrap_or(u32::MAX))
    }

    fn env_cleanup(&self) -> HalResult<()> {
        let mut st = self.state.lock();
        st.calls.push(HalCall::EnvCleanup);
        st.check(Fault::EnvCleanup, "env_cleanup")?;

        st.env_up = false;
        st.pools.clear();
        for port in st.ports.iter_mut() {
            port.state = SimPortState::default();
        }
        debug!("sim: environment released");
        Ok(())
    }

    fn socket_id(&self) -> SocketId {
        self.state.lock().caller_socket
    }
}

impl MempoolApi for SimHal {
    fn pool_create(&self, spec: &PoolSpec) -> HalResult<PoolHandle> {
        let mut st = self.state.lock();
        st.calls.push(HalCall::PoolCreate {
            name: spec.name.clone(),
            socket: spec.socket,
        });
        st.ensure_env("pool_create")?;
        st.check(Fault::PoolCreate, "pool_create")?;
        spec.validate()?;
        if st.pools.values().any(|p| p.name == spec.name) {
            return Err(HalError::status("pool_create", HalStatus::Exists));
        }

        let raw = st.next_pool;
        st.next_pool += 0x1000;
        let handle = PoolHandle::from_raw(raw)
            .ok_or_else(|| HalError::internal("pool handle allocator wrapped to null"))?;
        st.pools.insert(raw, spec.clone());
        debug!("sim: pool {} created as {}", spec.name, handle);
        Ok(handle)
    }

    fn pool_free(&self, pool: PoolHandle) {
        let mut st = self.state.lock();
        st.calls.push(HalCall::PoolFree(pool));
        if st.pools.remove(&pool.as_raw()).is_none() {
            debug!("sim: free of unknown pool {}", pool);
        }
    }
}

impl EthDevApi for SimHal {
    fn port_count_avail(&self) -> u16 {
        let st = self.state.lock();
        if !st.env_up {
            return 0;
        }
        st.reported_count.unwrap_or_else(|| {
            let open = st.ports.iter().filter(|p| !p.state.closed).count();
            u16::try_from(open).unwrap_or(u16::MAX)
        })
    }

    fn port_ids(&self) -> HalResult<Vec<PortId>> {
        let mut st = self.state.lock();
        st.calls.push(HalCall::PortIds);
        st.ensure_env("port_ids")?;
        st.check(Fault::PortEnumeration, "port_ids")?;
        Ok(st
            .ports
            .iter()
            .filter(|p| !p.state.closed)
            .map(|p| p.id)
            .collect())
    }

    fn dev_info(&self, port: PortId) -> HalResult<DeviceInfo> {
        let mut st = self.state.lock();
        st.calls.push(HalCall::DevInfo(port));
        st.ensure_env("dev_info")?;
        st.check(Fault::DevInfo(port), "dev_info")?;
        Ok(st.port(port)?.info.clone())
    }

    fn port_socket_id(&self, port: PortId) -> SocketId {
        self.state
            .lock()
            .port(port)
            .map(|p| p.socket)
            .unwrap_or(SocketId::ANY)
    }

    fn dev_configure(
        &self,
        port: PortId,
        nb_rx: u16,
        nb_tx: u16,
        conf: &PortConf,
    ) -> HalResult<()> {
        const OP: &str = "dev_configure";
        let mut st = self.state.lock();
        st.calls.push(HalCall::DevConfigure {
            port,
            nb_rx,
            nb_tx,
            conf: conf.clone(),
        });
        st.ensure_env(OP)?;
        st.check(Fault::DevConfigure(port), OP)?;
        let entry = st.port_mut(port)?;

        if entry.state.started {
            return Err(HalError::status(OP, HalStatus::Busy));
        }
        if nb_rx == 0
            || nb_tx == 0
            || nb_rx > entry.info.max_rx_queues
            || nb_tx > entry.info.max_tx_queues
        {
            return Err(HalError::status(OP, HalStatus::InvalidArgument));
        }
        if !entry.info.rx_offload_capa.contains(conf.rx_offloads)
            || !entry.info.tx_offload_capa.contains(conf.tx_offloads)
            || !entry.info.flow_type_rss_offloads.contains(conf.rss_hf)
        {
            debug!("sim: port {} rejects offloads outside its capabilities", port);
            return Err(HalError::status(OP, HalStatus::InvalidArgument));
        }

        entry.state.configured = true;
        entry.state.conf = Some(conf.clone());
        entry.state.rx_queues = vec![false; usize::from(nb_rx)];
        entry.state.tx_queues = vec![false; usize::from(nb_tx)];
        Ok(())
    }

    fn rx_queue_setup(
        &self,
        port: PortId,
        queue: u16,
        nb_desc: u16,
        socket: SocketId,
        pool: PoolHandle,
    ) -> HalResult<()> {
        const OP: &str = "rx_queue_setup";
        let mut st = self.state.lock();
        st.calls.push(HalCall::RxQueueSetup {
            port,
            queue,
            nb_desc,
            socket,
        });
        st.ensure_env(OP)?;
        st.check(Fault::RxQueueSetup(port), OP)?;
        let pool_known = st.pools.contains_key(&pool.as_raw());
        let entry = st.port_mut(port)?;

        if entry.state.started {
            return Err(HalError::status(OP, HalStatus::Busy));
        }
        if !entry.state.configured
            || usize::from(queue) >= entry.state.rx_queues.len()
            || nb_desc == 0
            || nb_desc > entry.info.max_ring_size
            || !pool_known
        {
            return Err(HalError::status(OP, HalStatus::InvalidArgument));
        }

        entry.state.rx_queues[usize::from(queue)] = true;
        entry.state.rx_ring_size = Some(nb_desc);
        entry.state.queue_socket = Some(socket);
        entry.state.rx_pool = Some(pool);
        Ok(())
    }

    fn tx_queue_setup(
        &self,
        port: PortId,
        queue: u16,
        nb_desc: u16,
        socket: SocketId,
    ) -> HalResult<()> {
        const OP: &str = "tx_queue_setup";
        let mut st = self.state.lock();
        st.calls.push(HalCall::TxQueueSetup {
            port,
            queue,
            nb_desc,
            socket,
        });
        st.ensure_env(OP)?;
        st.check(Fault::TxQueueSetup(port), OP)?;
        let entry = st.port_mut(port)?;

        if entry.state.started {
            return Err(HalError::status(OP, HalStatus::Busy));
        }
        if !entry.state.configured
            || usize::from(queue) >= entry.state.tx_queues.len()
            || nb_desc == 0
            || nb_desc > entry.info.max_ring_size
        {
            return Err(HalError::status(OP, HalStatus::InvalidArgument));
        }

        entry.state.tx_queues[usize::from(queue)] = true;
        entry.state.tx_ring_size = Some(nb_desc);
        Ok(())
    }

    fn dev_start(&self, port: PortId) -> HalResult<()> {
        let mut st = self.state.lock();
        st.calls.push(HalCall::DevStart(port));
        st.ensure_env("dev_start")?;
        st.check(Fault::DevStart(port), "dev_start")?;
        let entry = st.port_mut(port)?;

        if !entry.state.configured || !entry.state.queues_ready() {
            return Err(HalError::status("dev_start", HalStatus::InvalidArgument));
        }
        entry.state.started = true;
        Ok(())
    }

    fn dev_stop(&self, port: PortId) -> HalResult<()> {
        let mut st = self.state.lock();
        st.calls.push(HalCall::DevStop(port));
        st.ensure_env("dev_stop")?;
        st.check(Fault::DevStop(port), "dev_stop")?;
        st.port_mut(port)?.state.started = false;
        Ok(())
    }

    fn dev_close(&self, port: PortId) -> HalResult<()> {
        let mut st = self.state.lock();
        st.calls.push(HalCall::DevClose(port));
        st.ensure_env("dev_close")?;
        st.check(Fault::DevClose(port), "dev_close")?;
        let entry = st.port_mut(port)?;

        if entry.state.started {
            return Err(HalError::status("dev_close", HalStatus::Busy));
        }
        entry.state.closed = true;
        entry.state.configured = false;
        Ok(())
    }

    fn promiscuous_enable(&self, port: PortId) -> HalResult<()> {
        let mut st = self.state.lock();
        st.calls.push(HalCall::Promiscuous(port));
        st.ensure_env("promiscuous_enable")?;
        st.check(Fault::Promiscuous(port), "promiscuous_enable")?;
        let entry = st.port_mut(port)?;

        if !entry.state.configured {
            return Err(HalError::status(
                "promiscuous_enable",
                HalStatus::InvalidArgument,
            ));
        }
        entry.state.promiscuous = true;
        Ok(())
    }

    fn stats_get(&self, port: PortId) -> HalResult<PortStats> {
        let mut st = self.state.lock();
        st.calls.push(HalCall::StatsGet(port));
        st.ensure_env("stats_get")?;
        st.check(Fault::Stats(port), "stats_get")?;
        Ok(st.port(port)?.stats)
    }
}
