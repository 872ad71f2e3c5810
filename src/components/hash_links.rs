use crate::{
    error::{AppResult, IoResultExt},
    system::SystemOps,
};
use std::{
    io::ErrorKind as IoErrorKind,
    path::{Component, Path, PathBuf},
};

/// Rebuilds `<subject-hash>.0` symlinks by hand when `c_rehash` is not usable.
///
/// Only the directory listing is fatal to the rebuild. Every per-link
/// failure is logged and skipped.
pub struct HashLinkBuilder<'a, S: SystemOps + ?Sized> {
    certs_dir: &'a Path,
    bundles: Vec<PathBuf>,
    system: &'a S,
}

impl<'a, S: SystemOps + ?Sized> HashLinkBuilder<'a, S> {
    pub fn new(certs_dir: &'a Path, bundles: Vec<PathBuf>, system: &'a S) -> Self {
        Self {
            certs_dir,
            bundles,
            system,
        }
    }

    /// Returns the links that were created.
    pub async fn rebuild(&self) -> AppResult<Vec<PathBuf>> {
        info!("Creating hash links manually...");

        self.remove_stale_links().await?;

        let mut created = Vec::new();
        for bundle in &self.bundles {
            if let Some(link) = self.link_bundle(bundle).await {
                created.push(link);
            }
        }

        info!("Hash links created manually");
        Ok(created)
    }

    async fn remove_stale_links(&self) -> AppResult<()> {
        let mut entries = tokio::fs::read_dir(self.certs_dir)
            .await
            .io_context(format!("failed to list {}", self.certs_dir.display()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .io_context(format!("failed to list {}", self.certs_dir.display()))?
        {
            if !entry.file_name().to_string_lossy().ends_with(".0") {
                continue;
            }
            let path = entry.path();
            match entry.file_type().await {
                Ok(file_type) if file_type.is_symlink() => {
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        warn!("Failed to remove old link {}: {}", path.display(), e);
                    }
                }
                Ok(_) => trace!("Leaving non-link {} in place", path.display()),
                Err(e) => warn!("Failed to inspect {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    async fn link_bundle(&self, bundle: &Path) -> Option<PathBuf> {
        if tokio::fs::metadata(bundle).await.is_err() {
            return None;
        }

        let output = match self.system.subject_hash(bundle).await {
            Ok(output) => output,
            Err(e) => {
                debug!("No subject hash for {}: {}", bundle.display(), e);
                return None;
            }
        };
        let hash = output.trim();
        if hash.is_empty() {
            return None;
        }

        let link = self.certs_dir.join(format!("{}.0", hash));
        let target = relative_path(self.certs_dir, bundle).unwrap_or_else(|| bundle.to_path_buf());

        if let Err(e) = tokio::fs::remove_file(&link).await {
            if e.kind() != IoErrorKind::NotFound {
                warn!("Failed to remove existing link {}: {}", link.display(), e);
            }
        }
        match tokio::fs::symlink(&target, &link).await {
            Ok(()) => {
                debug!("{} -> {}", link.display(), target.display());
                Some(link)
            }
            Err(e) => {
                warn!(
                    "Failed to create link {} -> {}: {}",
                    link.display(),
                    target.display(),
                    e
                );
                None
            }
        }
    }
}

/// Lexical path of `target` as seen from the directory `base`.
///
/// `None` when one path is absolute and the other is not, or when `base`
/// climbs with `..` so the answer depends on the filesystem.
pub fn relative_path(base: &Path, target: &Path) -> Option<PathBuf> {
    if base.is_absolute() != target.is_absolute() {
        return None;
    }

    let base: Vec<Component> = base
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let target: Vec<Component> = target
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if base.iter().any(|c| matches!(c, Component::ParentDir)) {
        return None;
    }

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &target[common..] {
        relative.push(component.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::FakeSystem;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    fn hashing_system(hash: &str) -> FakeSystem {
        FakeSystem {
            subject_hash: Some(hash.to_owned()),
            ..FakeSystem::root()
        }
    }

    #[test]
    fn relative_paths() {
        let rel = |base: &str, target: &str| relative_path(Path::new(base), Path::new(target));

        assert_eq!(
            rel("/etc/ssl/certs", "/etc/ssl/certs/ca-certificates.crt"),
            Some(PathBuf::from("ca-certificates.crt"))
        );
        assert_eq!(
            rel("/etc/ssl/certs", "/usr/share/ca-certificates/bundle.crt"),
            Some(PathBuf::from("../../../usr/share/ca-certificates/bundle.crt"))
        );
        assert_eq!(rel("/etc/ssl", "/etc/ssl"), Some(PathBuf::from(".")));
        assert_eq!(rel("/etc/ssl", "certs/x.pem"), None);
        assert_eq!(rel("/etc/../ssl", "/etc/x.pem"), None);
    }

    #[tokio::test]
    async fn links_bundle_by_trimmed_hash_with_relative_target() {
        let dir = tempdir().unwrap();
        let bundle = dir.path().join("ca-certificates.crt");
        std::fs::write(&bundle, b"pem").unwrap();
        let system = hashing_system("5ed36f99\n");

        let created = HashLinkBuilder::new(dir.path(), vec![bundle.clone()], &system)
            .rebuild()
            .await
            .unwrap();

        let link = dir.path().join("5ed36f99.0");
        assert_eq!(created, vec![link.clone()]);
        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            PathBuf::from("ca-certificates.crt")
        );
        assert_eq!(std::fs::read(&link).unwrap(), b"pem");
    }

    #[tokio::test]
    async fn stale_links_are_replaced_and_regular_files_kept() {
        let dir = tempdir().unwrap();
        let bundle = dir.path().join("ca-certificates.crt");
        std::fs::write(&bundle, b"pem").unwrap();
        symlink("ca-certificates.crt", dir.path().join("deadbeef.0")).unwrap();
        symlink("ca-certificates.crt", dir.path().join("5ed36f99.0")).unwrap();
        symlink("ca-certificates.crt", dir.path().join("deadbeef.1")).unwrap();
        std::fs::write(dir.path().join("local.0"), b"not a link").unwrap();
        let system = hashing_system("5ed36f99");

        HashLinkBuilder::new(dir.path(), vec![bundle], &system)
            .rebuild()
            .await
            .unwrap();

        let mut links: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.file_type().unwrap().is_symlink())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        links.sort();
        assert_eq!(links, ["5ed36f99.0", "deadbeef.1"]);
        assert!(dir.path().join("local.0").is_file());
    }

    #[tokio::test]
    async fn hash_failure_skips_the_bundle() {
        let dir = tempdir().unwrap();
        let bundle = dir.path().join("ca-certificates.crt");
        std::fs::write(&bundle, b"pem").unwrap();
        let system = FakeSystem::root();

        let created = HashLinkBuilder::new(dir.path(), vec![bundle], &system)
            .rebuild()
            .await
            .unwrap();

        assert!(created.is_empty());
        assert_eq!(system.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_bundle_is_not_hashed() {
        let dir = tempdir().unwrap();
        let system = hashing_system("5ed36f99");

        let created = HashLinkBuilder::new(
            dir.path(),
            vec![dir.path().join("ca-certificates.crt")],
            &system,
        )
        .rebuild()
        .await
        .unwrap();

        assert!(created.is_empty());
        assert!(system.calls().is_empty());
    }

    #[tokio::test]
    async fn unremovable_link_name_is_only_a_warning() {
        let dir = tempdir().unwrap();
        let bundle = dir.path().join("ca-certificates.crt");
        std::fs::write(&bundle, b"pem").unwrap();
        // A directory under the link name defeats both the removal and the symlink.
        std::fs::create_dir(dir.path().join("5ed36f99.0")).unwrap();
        let system = hashing_system("5ed36f99");

        let created = HashLinkBuilder::new(dir.path(), vec![bundle], &system)
            .rebuild()
            .await
            .unwrap();

        assert!(created.is_empty());
        assert!(dir.path().join("5ed36f99.0").is_dir());
    }

    #[tokio::test]
    async fn unreadable_directory_fails_the_rebuild() {
        let dir = tempdir().unwrap();
        let system = hashing_system("5ed36f99");
        let missing = dir.path().join("missing");

        assert!(HashLinkBuilder::new(&missing, vec![], &system)
            .rebuild()
            .await
            .is_err());
    }
}
