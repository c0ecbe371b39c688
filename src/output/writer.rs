// Output Writer - Persists each finished group as its own stylesheet file

use super::template::{FileStem, NameVars, OutputName, OutputTarget};
use crate::extractors::{MediaGroups, QueryGroup};
use crate::pipeline::Pipeline;
use crate::utils::file_utils::write_creating_dirs;
use crate::Result;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A file written for one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub key: String,
    pub path: PathBuf,
    /// Name as expanded from the template, relative unless it was absolute
    pub display: String,
}

/// Everything needed to turn groups from one source file into files
pub struct OutputWriter<'a> {
    pub output_dir: &'a Path,
    pub name: &'a OutputName,
    pub pipeline: &'a Pipeline,
    pub stem: &'a FileStem,
    /// `[path]` value for this source file
    pub path_segment: &'a str,
    pub stats: bool,
}

impl OutputWriter<'_> {
    pub fn target(&self, group: &QueryGroup) -> OutputTarget {
        let expanded = self.name.expand(&NameVars {
            path: self.path_segment,
            name: &self.stem.name,
            query: &group.key,
            ext: &self.stem.ext,
        });
        OutputTarget::resolve(expanded, self.output_dir)
    }

    /// Run the group through the downstream plugins and write it
    pub fn write_group(&self, group: &QueryGroup) -> Result<WrittenArtifact> {
        self.write_to(group, self.target(group))
    }

    fn write_to(&self, group: &QueryGroup, target: OutputTarget) -> Result<WrittenArtifact> {
        let path = target.path();

        let css = self.pipeline.apply_plugins(&group.to_css(), &path)?;
        write_creating_dirs(&path, &css)?;

        if self.stats {
            info!("[extracted media query] {}", target.display);
        }
        Ok(WrittenArtifact {
            key: group.key.clone(),
            path,
            display: target.display,
        })
    }

    /// Write all groups, in parallel unless two of them share a target
    ///
    /// Returns once every write has finished; artifacts keep group order.
    /// Groups sharing a target are written one after another in group order,
    /// so the last group wins. Any failure fails the whole call.
    pub fn write_all(&self, groups: &MediaGroups) -> Result<Vec<WrittenArtifact>> {
        let jobs: Vec<(&QueryGroup, OutputTarget)> = groups
            .iter()
            .map(|group| (group, self.target(group)))
            .collect();

        let mut seen = HashSet::new();
        let shared = jobs
            .iter()
            .filter(|(_, target)| !seen.insert(target.path()))
            .count();
        if shared > 0 {
            warn!(
                "{} group(s) share an output file with an earlier group; writing sequentially",
                shared
            );
            return jobs
                .into_iter()
                .map(|(group, target)| self.write_to(group, target))
                .collect();
        }

        jobs.into_par_iter()
            .map(|(group, target)| self.write_to(group, target))
            .collect()
    }
}
