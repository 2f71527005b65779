use crate::aggregate::aggregate;
use crate::store::SnapshotStore;
use domain::{CellSnapshot, DeviceErrorEntry, GatewaySnapshot, PumpEntry, PumpSlot, RawDeviceReading};
use plc_config::DeviceConfig;
use plc_protocol::{DeviceReader, now_epoch_ms};
use plc_telemetry::{record_device_read_failure, record_device_read_success, record_poll_cycle};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, warn};

/// 单台设备在一个周期内的结果（成功读数或错误描述）。
#[derive(Debug, Clone)]
pub struct DeviceOutcome {
    pub cell_id: String,
    pub pump: PumpSlot,
    pub result: Result<RawDeviceReading, String>,
}

/// 一个轮询周期：并发读取全部设备，生成完整快照。
pub struct PollCycle {
    devices: Vec<DeviceConfig>,
    cell_ids: Vec<String>,
    reader: Arc<dyn DeviceReader>,
    device_timeout: Duration,
}

impl PollCycle {
    pub fn new(
        devices: Vec<DeviceConfig>,
        reader: Arc<dyn DeviceReader>,
        device_timeout: Duration,
    ) -> Self {
        let mut cell_ids: Vec<String> = devices.iter().map(|d| d.cell_id.clone()).collect();
        cell_ids.sort();
        cell_ids.dedup();
        Self {
            devices,
            cell_ids,
            reader,
            device_timeout,
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// 执行一次周期并返回快照（时间戳为周期开始时间）。
    pub async fn run_once(&self) -> GatewaySnapshot {
        let started_at_ms = now_epoch_ms();
        let started = Instant::now();

        // 每台设备一个任务；单个失败或超时只影响自己的结果
        let handles: Vec<_> = self
            .devices
            .iter()
            .map(|device| {
                let reader = Arc::clone(&self.reader);
                let address = device.address.clone();
                let port = device.port;
                let device_timeout = self.device_timeout;
                tokio::spawn(async move {
                    match timeout(device_timeout, reader.read(&address, port, device_timeout)).await
                    {
                        Ok(result) => result.map_err(|err| err.to_string()),
                        Err(_) => Err(format!(
                            "read abandoned after {} ms",
                            device_timeout.as_millis()
                        )),
                    }
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (device, handle) in self.devices.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(format!("device task failed: {}", join_err)),
            };
            match &result {
                Ok(_) => record_device_read_success(),
                Err(message) => {
                    record_device_read_failure();
                    warn!(
                        target: "plc.poll",
                        cell = %device.cell_id,
                        pump = %device.pump,
                        address = %device.address,
                        port = device.port,
                        error = %message,
                        "device read failed"
                    );
                }
            }
            outcomes.push(DeviceOutcome {
                cell_id: device.cell_id.clone(),
                pump: device.pump,
                result,
            });
        }

        let snapshot = build_snapshot(started_at_ms, &self.cell_ids, outcomes);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        record_poll_cycle(elapsed_ms);
        debug!(
            target: "plc.poll",
            cells = snapshot.cells.len(),
            errors = snapshot.cells.values().map(|c| c.errors.len()).sum::<usize>(),
            elapsed_ms,
            "poll cycle completed"
        );
        snapshot
    }

    /// 执行一次周期并发布到快照存储。
    pub async fn run_and_publish(&self, store: &SnapshotStore) {
        let snapshot = self.run_once().await;
        store.publish(snapshot);
    }
}

/// 按单元分组结果并计算聚合。
///
/// `cell_ids` 中的每个单元都会出现在快照中；没有读数的泵位为离线待机，
/// 读取失败的泵位额外记录一条错误。
pub fn build_snapshot(
    updated_at_ms: i64,
    cell_ids: &[String],
    outcomes: Vec<DeviceOutcome>,
) -> GatewaySnapshot {
    let mut pumps: BTreeMap<String, BTreeMap<PumpSlot, PumpEntry>> = cell_ids
        .iter()
        .map(|cell_id| (cell_id.clone(), offline_slots()))
        .collect();
    let mut errors: BTreeMap<String, Vec<DeviceErrorEntry>> = BTreeMap::new();

    for outcome in outcomes {
        let slots = pumps
            .entry(outcome.cell_id.clone())
            .or_insert_with(offline_slots);
        match outcome.result {
            Ok(reading) => {
                slots.insert(outcome.pump, PumpEntry::online(reading));
            }
            Err(message) => {
                errors
                    .entry(outcome.cell_id)
                    .or_default()
                    .push(DeviceErrorEntry {
                        pump: outcome.pump,
                        message,
                    });
            }
        }
    }

    let cells = pumps
        .into_iter()
        .map(|(cell_id, slots)| {
            let pump1 = slots
                .get(&PumpSlot::Pump1)
                .map(|entry| entry.reading)
                .unwrap_or(RawDeviceReading::IDLE);
            let pump2 = slots
                .get(&PumpSlot::Pump2)
                .map(|entry| entry.reading)
                .unwrap_or(RawDeviceReading::IDLE);
            let cell = CellSnapshot {
                pumps: slots,
                process: aggregate(&pump1, &pump2),
                errors: errors.remove(&cell_id).unwrap_or_default(),
            };
            (cell_id, cell)
        })
        .collect();

    GatewaySnapshot {
        updated_at_ms: Some(updated_at_ms),
        cells,
    }
}

fn offline_slots() -> BTreeMap<PumpSlot, PumpEntry> {
    PumpSlot::ALL
        .iter()
        .map(|slot| (*slot, PumpEntry::offline()))
        .collect()
}

/// 固定节拍的轮询循环。周期超时不跳拍：上一周期结束后立即开始下一周期。
pub async fn run_poll_loop(cycle: PollCycle, store: Arc<SnapshotStore>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        cycle.run_and_publish(&store).await;
    }
}
