// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::JobStatus;
use crate::domain::models::progress::ProgressEvent;
use crate::domain::services::progress_reporter::ProgressReporter;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

/// 推送给 WebSocket 客户端的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubMessage {
    Connection {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Pong,
    Progress {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_id: Option<Uuid>,
        current: usize,
        total: usize,
        percentage: f64,
        message: String,
    },
    JobUpdate {
        job_id: Uuid,
        status: JobStatus,
    },
}

impl HubMessage {
    pub fn connected() -> Self {
        HubMessage::Connection {
            message: "Connected to MK Processor".to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl From<&ProgressEvent> for HubMessage {
    fn from(event: &ProgressEvent) -> Self {
        HubMessage::Progress {
            job_id: event.job_id,
            current: event.current,
            total: event.total,
            percentage: event.percentage,
            message: event.message.clone(),
        }
    }
}

/// 一个观察者的订阅
pub struct Subscription {
    pub id: u64,
    pub receiver: mpsc::Receiver<HubMessage>,
}

/// 进度广播中心
///
/// 每个观察者有一个有界队列，发送使用 `try_send`，永远不会阻塞执行器。
/// 队列满时丢弃这一条消息，观察者断开后从中心移除。
pub struct ProgressHub {
    subscribers: DashMap<u64, mpsc::Sender<HubMessage>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl ProgressHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// 注册一个新的观察者
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, tx);
        debug!(subscriber = id, "Progress observer subscribed");
        Subscription { id, receiver: rx }
    }

    pub fn unsubscribe(&self, id: u64) {
        if self.subscribers.remove(&id).is_some() {
            debug!(subscriber = id, "Progress observer unsubscribed");
        }
    }

    /// 当前连接的观察者数量
    pub fn active_connections(&self) -> usize {
        self.subscribers.len()
    }

    /// 广播一条消息
    pub fn publish(&self, message: HubMessage) {
        let mut closed = Vec::new();

        for entry in self.subscribers.iter() {
            match entry.value().try_send(message.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = *entry.key(), "Progress observer is lagging, event dropped");
                }
                Err(TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }

        // Removing while iterating would deadlock the shard
        for id in closed {
            self.subscribers.remove(&id);
            warn!(subscriber = id, "Progress observer disconnected, removed from hub");
        }
    }
}

impl ProgressReporter for ProgressHub {
    fn report(&self, event: &ProgressEvent) {
        self.publish(HubMessage::from(event));
    }

    fn job_changed(&self, job_id: Uuid, status: JobStatus) {
        self.publish(HubMessage::JobUpdate { job_id, status });
    }
}
