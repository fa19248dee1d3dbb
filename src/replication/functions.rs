//! The impls and functions
//!
use std::{fmt, time::Instant};
use async_trait::async_trait;
use log::*;
use mongodb::bson::{doc, DateTime};
use crate::gateway::{decode, AdminGateway, GatewayError};
use crate::replication::{MemberState, ReplSetConfig, ReplSetConfigResponse, ReplSetStatus, ReplicationCollector, ReplicationSnapshot, Role};
use crate::schema::Family;
use crate::snapshot::{Collector, MetricSink};

impl MemberState {
    pub const STARTUP: MemberState = MemberState(0);
    pub const PRIMARY: MemberState = MemberState(1);
    pub const SECONDARY: MemberState = MemberState(2);
    pub const RECOVERING: MemberState = MemberState(3);
    pub const STARTUP2: MemberState = MemberState(5);
    pub const UNKNOWN: MemberState = MemberState(6);
    pub const ARBITER: MemberState = MemberState(7);
    pub const DOWN: MemberState = MemberState(8);
    pub const ROLLBACK: MemberState = MemberState(9);
    pub const REMOVED: MemberState = MemberState(10);

    /// A member is in an odd state when it is not primary, secondary, arbiter or in initial sync.
    pub fn is_odd(&self) -> bool
    {
        !matches!(*self, MemberState::PRIMARY | MemberState::SECONDARY | MemberState::ARBITER | MemberState::STARTUP2)
    }
    pub fn role(&self) -> Role
    {
        match *self {
            MemberState::PRIMARY => Role::Primary,
            MemberState::SECONDARY => Role::Secondary,
            _ => Role::Other,
        }
    }
}

impl fmt::Display for MemberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match *self {
            MemberState::STARTUP => "STARTUP",
            MemberState::PRIMARY => "PRIMARY",
            MemberState::SECONDARY => "SECONDARY",
            MemberState::RECOVERING => "RECOVERING",
            MemberState::STARTUP2 => "STARTUP2",
            MemberState::UNKNOWN => "UNKNOWN",
            MemberState::ARBITER => "ARBITER",
            MemberState::DOWN => "DOWN",
            MemberState::ROLLBACK => "ROLLBACK",
            MemberState::REMOVED => "REMOVED",
            _ => return write!(f, "STATE({})", self.0),
        };
        write!(f, "{}", name)
    }
}

impl Role {
    pub fn label(&self) -> &'static str
    {
        match self {
            Role::Primary => "primary",
            Role::Secondary => "secondary",
            Role::Other => "other",
        }
    }
}

/// Emit the role indicator: 1 for the given role, 0 for the other two.
pub fn emit_role(
    sink: &MetricSink,
    role: Role,
)
{
    for candidate in [Role::Primary, Role::Secondary, Role::Other] {
        let value = if candidate == role { 1.0 } else { 0.0 };
        sink.render(Family::ReplRole, "role", value, &[candidate.label()]);
    }
}

fn seconds(date: DateTime) -> i64
{
    date.to_chrono().timestamp()
}

impl ReplSetStatus {
    pub async fn read(gateway: &dyn AdminGateway) -> Result<Self, GatewayError>
    {
        let response = gateway.run_command("admin", doc! { "replSetGetStatus": 1, "initialSync": 1 }).await?;
        decode(response, "replSetGetStatus")
    }
}

impl ReplSetConfig {
    pub async fn read(gateway: &dyn AdminGateway) -> Result<Self, GatewayError>
    {
        let response = gateway.run_command("admin", doc! { "replSetGetConfig": 1 }).await?;
        let response: ReplSetConfigResponse = decode(response, "replSetGetConfig")?;
        Ok(response.config)
    }
}

impl ReplicationSnapshot {
    /// Derive the replication facts for the member flagged `self`.
    /// Without a self member there is nothing to report on, and `None` is returned.
    pub fn derive(
        status: &ReplSetStatus,
        config: &ReplSetConfig,
    ) -> Option<Self>
    {
        let me = status.members.iter().find(|member| member.is_self)?;
        let date = seconds(status.date);

        let mut snapshot = ReplicationSnapshot {
            odd_state: MemberState::PRIMARY.0,
            status: status.my_state.0,
            version: config.version,
            term: config.term,
            protocol_version: config.protocol_version,
            ..Default::default()
        };

        let mut primary_optime = date;
        for member in &status.members {
            if !member.is_self {
                // a member that was never heard from has no lastHeartbeatRecv, and does not count.
                if let Some(last_heartbeat_recv) = member.last_heartbeat_recv {
                    snapshot.heartbeat_delay = snapshot.heartbeat_delay.max(date - seconds(last_heartbeat_recv));
                }
            }
            if member.state == MemberState::PRIMARY {
                primary_optime = member.optime_date.map(seconds).unwrap_or(date);
                snapshot.elected_before_secs = member.election_date.map(|election_date| date - seconds(election_date)).unwrap_or_default();
            }
            if member.state.is_odd() {
                snapshot.odd_state = member.state.0;
            }
        }

        // an arbiter has no optime, and is never behind.
        if let Some(my_optime) = me.optime_date {
            snapshot.lag = (primary_optime - seconds(my_optime)).max(0);
        }

        if let Some(member) = config.members.iter().find(|member| member.host == me.name) {
            snapshot.arbiter_only = member.arbiter_only;
            snapshot.build_indexes = member.build_indexes;
            snapshot.hidden = member.hidden;
            snapshot.priority = member.priority;
            snapshot.votes = member.votes;
        }

        Some(snapshot)
    }
    /// The `mongodb_replstats` fields and their values.
    pub fn fields(&self) -> Vec<(&'static str, f64)>
    {
        let flag = |value: bool| if value { 1.0 } else { 0.0 };
        vec![
            ("heartbeat_delay", self.heartbeat_delay as f64),
            ("lag", self.lag as f64),
            ("odd_state", self.odd_state as f64),
            ("elected_before_secs", self.elected_before_secs as f64),
            ("status", self.status as f64),
            ("version", self.version as f64),
            ("term", self.term as f64),
            ("protocolVersion", self.protocol_version as f64),
            ("arbiterOnly", flag(self.arbiter_only)),
            ("buildIndexes", flag(self.build_indexes)),
            ("hidden", flag(self.hidden)),
            ("priority", self.priority),
            ("votes", self.votes),
        ]
    }
}

#[async_trait]
impl Collector for ReplicationCollector {
    fn name(&self) -> &'static str
    {
        "replicasetstatus"
    }
    async fn collect(
        &self,
        gateway: &dyn AdminGateway,
        sink: &MetricSink,
    )
    {
        info!("begin replication status");
        let timer = Instant::now();

        if self.is_mongos {
            emit_role(sink, Role::Other);
            return;
        }

        let status = match ReplSetStatus::read(gateway).await {
            Ok(status) => status,
            Err(error) => {
                error!("Failed to get replication status: {}", error);
                return;
            }
        };
        emit_role(sink, status.my_state.role());

        let config = match ReplSetConfig::read(gateway).await {
            Ok(config) => config,
            Err(error) => {
                error!("Failed to get replication config: {}", error);
                return;
            }
        };

        match ReplicationSnapshot::derive(&status, &config) {
            Some(snapshot) => {
                debug!("replica set {} config version {}, member state {}: {:?}", config.id, config.version, status.my_state, snapshot);
                sink.render_fields(Family::ReplStats, &snapshot.fields(), &[]);
            }
            None => error!("Failed to find self member in replication status of {}", status.set.as_deref().unwrap_or_default()),
        }

        info!("end replication status: {:?}", timer.elapsed());
    }
}
