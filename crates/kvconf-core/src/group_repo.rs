//! Group repository.
//!
//! Groups embed copies of configurations. Attaching and detaching are
//! read-modify-write cycles on the group's single key. The write-back is a
//! compare-and-set on the modify index observed by the read; when another
//! writer got there first the whole cycle restarts from a fresh read, up to
//! `cas_max_retries` times.

use std::sync::Arc;

use kvconf_common::{GROUPS_ROOT, KvconfError, Result};
use kvconf_store::KvBackend;
use tracing::{debug, info, warn};

use crate::config_repo::ConfigRepository;
use crate::context::OpContext;
use crate::key::{encode_group_key, group_id_prefix, new_id, validate_segment};
use crate::model::{Configuration, DeleteSummary, DetachOutcome, Group, decode, encode};
use crate::scan;

pub const GROUP_NOT_FOUND: &str = "group not found";
pub const CONFIG_NOT_FOUND_IN_GROUP: &str = "config not found in group";
pub const DEFAULT_CAS_MAX_RETRIES: u32 = 5;

/// How a group is addressed
#[derive(Clone, Copy, Debug)]
enum GroupRef<'a> {
    Coordinates { id: &'a str, version: &'a str },
    /// Legacy addressing: first group stored under the id
    Id(&'a str),
}

impl GroupRef<'_> {
    fn prefix(&self) -> String {
        match self {
            GroupRef::Coordinates { id, version } => encode_group_key(id, version),
            GroupRef::Id(id) => group_id_prefix(id),
        }
    }

    fn matches(&self, group: &Group) -> bool {
        match self {
            GroupRef::Coordinates { id, version } => group.id == *id && group.version == *version,
            GroupRef::Id(id) => group.id == *id,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            GroupRef::Coordinates { id, version } => {
                validate_segment("group id", id, false)?;
                validate_segment("group version", version, false)
            }
            GroupRef::Id(id) => validate_segment("group id", id, false),
        }
    }
}

/// The configuration to attach
#[derive(Clone, Copy, Debug)]
enum MemberRef<'a> {
    Coordinates { id: &'a str, version: &'a str },
    Id(&'a str),
}

impl MemberRef<'_> {
    fn validate(&self) -> Result<()> {
        match self {
            MemberRef::Coordinates { id, version } => {
                validate_segment("config id", id, false)?;
                validate_segment("config version", version, false)
            }
            MemberRef::Id(id) => validate_segment("config id", id, false),
        }
    }
}

/// A group together with where it is stored and the index it was read at
struct Located {
    group: Group,
    key: String,
    modify_index: u64,
}

#[derive(Clone)]
pub struct GroupRepository {
    backend: Arc<dyn KvBackend>,
    configs: ConfigRepository,
    cas_max_retries: u32,
}

impl GroupRepository {
    pub fn new(backend: Arc<dyn KvBackend>, configs: ConfigRepository) -> Self {
        Self {
            backend,
            configs,
            cas_max_retries: DEFAULT_CAS_MAX_RETRIES,
        }
    }

    pub fn with_cas_max_retries(mut self, retries: u32) -> Self {
        self.cas_max_retries = retries;
        self
    }

    pub async fn create(&self, ctx: &OpContext, grp: Group) -> Result<Group> {
        validate_segment("version", &grp.version, false)?;
        validate_segment("labels", &grp.labels, true)?;

        let grp = Group { id: new_id(), ..grp };
        let key = encode_group_key(&grp.id, &grp.version);
        let payload = encode(&grp)?;

        ctx.run("put", self.backend.put(&key, payload)).await?;

        info!(id = %grp.id, version = %grp.version, "Group created");
        Ok(grp)
    }

    /// Groups stored at the id and version, as a list
    pub async fn get(&self, ctx: &OpContext, id: &str, version: &str) -> Result<Vec<Group>> {
        self.find(ctx, GroupRef::Coordinates { id, version }).await
    }

    pub async fn get_one(&self, ctx: &OpContext, id: &str, version: &str) -> Result<Group> {
        first_group(self.get(ctx, id, version).await?)
    }

    pub async fn list_all(&self, ctx: &OpContext) -> Result<Vec<Group>> {
        let entries = scan::list_root(ctx, self.backend.as_ref(), GROUPS_ROOT).await?;
        scan::decode_all(&entries)
    }

    pub async fn delete(&self, ctx: &OpContext, id: &str, version: &str) -> Result<DeleteSummary> {
        validate_segment("id", id, false)?;
        validate_segment("version", version, false)?;

        let key = encode_group_key(id, version);
        let removed = scan::delete_subtree(ctx, self.backend.as_ref(), &key).await?;
        info!(id = %id, version = %version, removed, "Group deleted");
        Ok(DeleteSummary::new(id))
    }

    pub async fn get_by_id(&self, ctx: &OpContext, id: &str) -> Result<Vec<Group>> {
        self.find(ctx, GroupRef::Id(id)).await
    }

    pub async fn get_one_by_id(&self, ctx: &OpContext, id: &str) -> Result<Group> {
        first_group(self.get_by_id(ctx, id).await?)
    }

    /// Remove every version of a group
    pub async fn delete_by_id(&self, ctx: &OpContext, id: &str) -> Result<DeleteSummary> {
        validate_segment("id", id, false)?;

        let prefix = group_id_prefix(id);
        let removed = ctx
            .run("delete_tree", self.backend.delete_tree(&prefix))
            .await?;
        info!(id = %id, removed, "Group deleted by id");
        Ok(DeleteSummary::new(id))
    }

    /// Append a copy of configuration `cid`/`cver` to the group
    pub async fn attach_configuration(
        &self,
        ctx: &OpContext,
        gid: &str,
        gver: &str,
        cid: &str,
        cver: &str,
    ) -> Result<Group> {
        let target = GroupRef::Coordinates {
            id: gid,
            version: gver,
        };
        let member = MemberRef::Coordinates {
            id: cid,
            version: cver,
        };
        self.attach(ctx, target, member).await
    }

    /// Remove the first member with id `cid` from the group.
    ///
    /// The group is written back even when no member matched; the miss is
    /// reported through [`DetachOutcome::removed`].
    pub async fn detach_configuration(
        &self,
        ctx: &OpContext,
        gid: &str,
        gver: &str,
        cid: &str,
    ) -> Result<DetachOutcome> {
        let target = GroupRef::Coordinates {
            id: gid,
            version: gver,
        };
        self.detach(ctx, target, cid).await
    }

    /// Legacy attach: group and configuration are both resolved by id alone
    pub async fn attach_configuration_by_id(
        &self,
        ctx: &OpContext,
        gid: &str,
        cid: &str,
    ) -> Result<Group> {
        self.attach(ctx, GroupRef::Id(gid), MemberRef::Id(cid)).await
    }

    pub async fn detach_configuration_by_id(
        &self,
        ctx: &OpContext,
        gid: &str,
        cid: &str,
    ) -> Result<DetachOutcome> {
        self.detach(ctx, GroupRef::Id(gid), cid).await
    }

    async fn find(&self, ctx: &OpContext, target: GroupRef<'_>) -> Result<Vec<Group>> {
        target.validate()?;
        let entries = scan::list(ctx, self.backend.as_ref(), &target.prefix()).await?;
        let groups: Vec<Group> = scan::decode_all(&entries)?;
        Ok(groups.into_iter().filter(|g| target.matches(g)).collect())
    }

    async fn locate(&self, ctx: &OpContext, target: GroupRef<'_>) -> Result<Located> {
        let entries = scan::list(ctx, self.backend.as_ref(), &target.prefix()).await?;
        for entry in entries {
            let group: Group = decode(&entry.value)?;
            if target.matches(&group) {
                return Ok(Located {
                    group,
                    key: entry.key,
                    modify_index: entry.modify_index,
                });
            }
        }
        Err(KvconfError::not_found(GROUP_NOT_FOUND))
    }

    async fn resolve_member(&self, ctx: &OpContext, member: MemberRef<'_>) -> Result<Configuration> {
        match member {
            MemberRef::Coordinates { id, version } => self.configs.get_one(ctx, id, version).await,
            MemberRef::Id(id) => self.configs.get_one_by_id(ctx, id).await,
        }
    }

    /// Write the group back only if nobody wrote it since it was read
    async fn write_back(&self, ctx: &OpContext, located: &Located) -> Result<bool> {
        let payload = encode(&located.group)?;
        ctx.run(
            "compare_and_set",
            self.backend
                .compare_and_set(&located.key, payload, located.modify_index),
        )
        .await
    }

    async fn attach(
        &self,
        ctx: &OpContext,
        target: GroupRef<'_>,
        member: MemberRef<'_>,
    ) -> Result<Group> {
        target.validate()?;
        member.validate()?;

        // Configurations are immutable, so the copy is resolved once
        let mut copy: Option<Configuration> = None;

        for attempt in 0..=self.cas_max_retries {
            let mut located = self.locate(ctx, target).await?;
            let config = match &copy {
                Some(config) => config.clone(),
                None => {
                    let config = self.resolve_member(ctx, member).await?;
                    copy = Some(config.clone());
                    config
                }
            };

            located.group.configs.push(config);
            if self.write_back(ctx, &located).await? {
                info!(
                    group = %located.group.id,
                    version = %located.group.version,
                    members = located.group.configs.len(),
                    "Configuration attached to group"
                );
                return Ok(located.group);
            }
            record_retry(&located.key, attempt);
        }

        Err(self.exhausted(target))
    }

    async fn detach(
        &self,
        ctx: &OpContext,
        target: GroupRef<'_>,
        cid: &str,
    ) -> Result<DetachOutcome> {
        target.validate()?;
        validate_segment("config id", cid, false)?;

        for attempt in 0..=self.cas_max_retries {
            let mut located = self.locate(ctx, target).await?;
            let removed = located.group.remove_first(cid);

            if self.write_back(ctx, &located).await? {
                if removed {
                    info!(group = %located.group.id, config = %cid, "Configuration detached from group");
                } else {
                    debug!(group = %located.group.id, config = %cid, "Configuration not found in group");
                }
                return Ok(DetachOutcome {
                    group: located.group,
                    removed,
                });
            }
            record_retry(&located.key, attempt);
        }

        Err(self.exhausted(target))
    }

    fn exhausted(&self, target: GroupRef<'_>) -> KvconfError {
        warn!(
            group = %target.prefix(),
            retries = self.cas_max_retries,
            "Giving up on group update after repeated concurrent modifications"
        );
        KvconfError::Conflict(format!(
            "group was modified concurrently, gave up after {} retries",
            self.cas_max_retries
        ))
    }
}

fn record_retry(key: &str, attempt: u32) {
    metrics::counter!("group_cas_retries_total").increment(1);
    debug!(key = %key, attempt, "Group changed since read, retrying");
}

fn first_group(groups: Vec<Group>) -> Result<Group> {
    groups
        .into_iter()
        .next()
        .ok_or_else(|| KvconfError::not_found(GROUP_NOT_FOUND))
}
