use std::collections::HashSet;

/// Mutable index files that are always re-uploaded, even when an object with
/// the same name already exists.
pub const FORCE_UPDATE: &[&str] = &[
    "repodata/repomd.xml",
    "info/refs",
    "objects/info/packs",
    "packed-refs",
    "HEAD",
    "FETCH_HEAD",
];

/// Index files published only after everything they reference.
pub const PUBLISH_LAST: &[&str] = &["repodata/repomd.xml"];

/// Source paths absent from the destination (`source - destination`), in
/// source order without duplicates.
pub fn missing(source: &[String], destination: &[String]) -> Vec<String> {
    let present = destination.iter().map(String::as_str).collect::<HashSet<_>>();
    dedup(source.iter().filter(|uri| !present.contains(uri.as_str())))
}

/// Destination names absent from the source (`destination - source`), in
/// destination order without duplicates.
pub fn unneeded(source: &[String], destination: &[String]) -> Vec<String> {
    let wanted = source.iter().map(String::as_str).collect::<HashSet<_>>();
    dedup(destination.iter().filter(|name| !wanted.contains(name.as_str())))
}

/// Whether `uri` is one of the [`FORCE_UPDATE`] files, at the top level or
/// below any directory.
pub fn is_forced(uri: &str) -> bool {
    FORCE_UPDATE.iter().any(|suffix| {
        uri == *suffix
            || uri
                .strip_suffix(suffix)
                .is_some_and(|head| head.ends_with('/'))
    })
}

/// Map destination object names back to mirror-relative paths by removing a
/// leading `prefix`.
pub fn strip_prefix(names: &[String], prefix: &str) -> Vec<String> {
    names
        .iter()
        .map(|name| name.strip_prefix(prefix).unwrap_or(name).to_string())
        .collect()
}

fn dedup<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen: HashSet<&'a String> = HashSet::new();
    items
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// Files to transfer for one mirror plus the destination objects the mirror
/// no longer publishes. Unneeded objects are reported only, never deleted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MirrorPlan {
    pub transfers: Vec<String>,
    pub unneeded: Vec<String>,
}

impl MirrorPlan {
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}

/// Decides which source paths get transferred.
#[derive(Clone, Copy, Debug, Default)]
pub struct MirrorPlanner {
    update: bool,
}

impl MirrorPlanner {
    /// With `update` every source path is scheduled and the transfer engine
    /// decides by size; otherwise only missing and forced paths are.
    pub fn new(update: bool) -> Self {
        Self { update }
    }

    /// Whether the transfer engine should compare sizes before uploading.
    pub fn needs_size_check(&self, uri: &str) -> bool {
        self.update && !is_forced(uri)
    }

    /// Plan a mirror given its source URIs and the raw destination object
    /// names listed under `prefix`.
    pub fn plan(&self, source: &[String], object_names: &[String], prefix: &str) -> MirrorPlan {
        let destination = strip_prefix(object_names, prefix);

        let mut transfers = if self.update {
            dedup(source.iter())
        } else {
            let present = destination.iter().map(String::as_str).collect::<HashSet<_>>();
            dedup(
                source
                    .iter()
                    .filter(|uri| !present.contains(uri.as_str()) || is_forced(uri)),
            )
        };

        for index in PUBLISH_LAST {
            if let Some(pos) = transfers.iter().position(|uri| uri.as_str() == *index) {
                let uri = transfers.remove(pos);
                transfers.push(uri);
            }
        }

        MirrorPlan {
            transfers,
            unneeded: unneeded(source, &destination),
        }
    }
}
