//! Path Classifier: infers the build mode from the file-path shapes and
//! attributes each file to its owning module's package set.

use crate::error::{AnalysisError, Result};
use crate::model::{Module, AUTOGENERATED_FILE};
use log::{debug, warn};

/// A build is trimmed iff every file path is relative.
fn is_trimmed(files: &[String]) -> bool {
    files.iter().all(|f| !f.starts_with('/'))
}

/// The module-cache prefix is the text before the first occurrence of
/// `"/" + module.fullName()` across all files, including the separating
/// slash; first match wins, scanning modules in declaration order.
fn module_cache_prefix(modules: &[Module], files: &[String]) -> Option<String> {
    for module in modules {
        let needle = format!("/{}", module.full_name());
        for file in files {
            if let Some(idx) = file.find(&needle) {
                return Some(file[..idx + 1].to_string());
            }
        }
    }
    None
}

/// Finds a `vendor/<module.name>/` subtree and confirms it by requiring at
/// least one other file sharing the candidate root but not nested under
/// that vendor subpath.
fn vendor_prefix(modules: &[Module], files: &[String]) -> Option<String> {
    for module in modules {
        let needle = format!("vendor/{}/", module.name());
        for file in files {
            let Some(idx) = file.find(&needle) else {
                continue;
            };
            let root = &file[..idx];
            let vendor_subpath = format!("{root}vendor/");
            let confirmed = files
                .iter()
                .any(|f| f.starts_with(root) && !f.starts_with(&vendor_subpath));
            if confirmed {
                return Some(vendor_subpath);
            }
        }
    }
    None
}

/// The parent directory of a stripped relative path, or `""` if the path
/// is a bare file at its module's root.
fn dir_name(relative: &str) -> &str {
    match relative.rfind('/') {
        Some(0) | None => "",
        Some(idx) => &relative[..idx],
    }
}

/// Attempts to split `path` at `key`; on success, returns the remainder
/// after `key`. Any non-empty component before `key` is a structural
/// classification failure.
fn split_at_key<'a>(path: &'a str, key: &str) -> Result<Option<&'a str>> {
    let Some(idx) = path.find(key) else {
        return Ok(None);
    };
    if idx != 0 {
        return Err(AnalysisError::FileNameClassificationFailure {
            file_name: path.to_string(),
            module_name: key.to_string(),
        });
    }
    Ok(Some(&path[key.len()..]))
}

/// Populates every module's package set from the file list.
///
/// When more than one module's key is a prefix of a stripped path (for
/// example `"example.com/a"` and `"example.com/a/sub"`), only the longest
/// matching key wins: candidates are sorted by descending key length and
/// the first match is attributed, the rest are left untouched. This keeps
/// every package listed under exactly one module even when module keys
/// overlap.
pub fn classify(modules: &mut [Module], files: &[String]) -> Result<()> {
    let trimmed = is_trimmed(files);
    let cache_prefix = if trimmed {
        None
    } else {
        module_cache_prefix(modules, files)
    };
    let vendor = if trimmed {
        None
    } else {
        vendor_prefix(modules, files)
    };

    debug!(
        "classifier state: trimmed={trimmed} module_cache_prefix={cache_prefix:?} vendor_prefix={vendor:?}"
    );

    for file in files {
        if file == AUTOGENERATED_FILE {
            continue;
        }

        let (stripped, match_on_full_name): (&str, bool) =
            if let Some(prefix) = vendor.as_deref().filter(|p| file.starts_with(p)) {
                (&file[prefix.len()..], false)
            } else if let Some(prefix) = cache_prefix.as_deref().filter(|p| file.starts_with(p)) {
                (&file[prefix.len()..], true)
            } else if cache_prefix.is_none() && vendor.is_none() {
                (file.as_str(), true)
            } else {
                debug!("file {file:?} matched neither the vendor nor module-cache prefix; treating as stdlib");
                continue;
            };

        let mut candidates: Vec<usize> = (0..modules.len())
            .filter(|&i| {
                let key = classify_key(&modules[i], match_on_full_name);
                !key.is_empty() && stripped.starts_with(key.as_str())
            })
            .collect();
        candidates
            .sort_by_key(|&i| std::cmp::Reverse(classify_key(&modules[i], match_on_full_name).len()));

        match candidates.first() {
            Some(&i) => {
                let key = classify_key(&modules[i], match_on_full_name);
                if let Some(relative) = split_at_key(stripped, &key)? {
                    let pkg = format!("{}{}", modules[i].name(), dir_name(relative));
                    modules[i].add_package(pkg);
                }
            }
            None => warn!("file {file:?} did not match any known module key"),
        }
    }

    Ok(())
}

fn classify_key(module: &Module, full_name: bool) -> String {
    if full_name {
        module.full_name()
    } else {
        module.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_cache_scenario() -> (Vec<Module>, Vec<String>) {
        let modules = vec![
            Module::new("example.com/a", "v1.0.0", true),
            Module::new("example.com/b", "v2.1.0", false),
        ];
        let files = vec!["/root/pkg/mod/example.com/b@v2.1.0/x/y.go".to_string()];
        (modules, files)
    }

    #[test]
    fn attributes_module_cache_files_by_full_name() {
        let (mut modules, files) = module_cache_scenario();
        classify(&mut modules, &files).unwrap();
        assert!(modules[0].packages().is_empty());
        assert_eq!(
            modules[1].packages().iter().collect::<Vec<_>>(),
            vec!["example.com/b/x"]
        );
    }

    #[test]
    fn trimpath_binary_matches_against_full_name() {
        let mut modules = vec![Module::new("example.com/b", "v2.1.0", false)];
        let files = vec!["example.com/b@v2.1.0/x/y.go".to_string()];
        classify(&mut modules, &files).unwrap();
        assert_eq!(
            modules[0].packages().iter().collect::<Vec<_>>(),
            vec!["example.com/b/x"]
        );
    }

    #[test]
    fn vendored_binary_matches_against_bare_name() {
        let mut modules = vec![Module::new("example.com/b", "v2.1.0", false)];
        let files = vec![
            "/app/vendor/example.com/b/x/y.go".to_string(),
            "/app/main.go".to_string(),
        ];
        classify(&mut modules, &files).unwrap();
        assert_eq!(
            modules[0].packages().iter().collect::<Vec<_>>(),
            vec!["example.com/b/x"]
        );
    }

    #[test]
    fn bare_file_at_module_root_has_empty_dir_name() {
        let mut modules = vec![Module::new("example.com/b", "v2.1.0", false)];
        let files = vec!["example.com/b@v2.1.0/main.go".to_string()];
        classify(&mut modules, &files).unwrap();
        assert_eq!(
            modules[0].packages().iter().collect::<Vec<_>>(),
            vec!["example.com/b"]
        );
    }

    /// Uses bare names (no `@version` suffix) under a confirmed vendor
    /// prefix, so `"example.com/a"` really is a string-prefix of
    /// `"example.com/a/sub"`'s stripped path, the overlap the full-name
    /// variant below can't actually exercise, since the `@version` suffix
    /// on the shorter key breaks the prefix relationship.
    #[test]
    fn overlapping_bare_names_under_vendor_prefer_the_longest_match() {
        let mut modules = vec![
            Module::new("example.com/a", "v1.0.0", false),
            Module::new("example.com/a/sub", "v1.0.0", false),
        ];
        let files = vec![
            "/app/vendor/example.com/a/sub/x.go".to_string(),
            "/app/main.go".to_string(),
        ];
        classify(&mut modules, &files).unwrap();
        assert!(modules[0].packages().is_empty());
        assert_eq!(
            modules[1].packages().iter().collect::<Vec<_>>(),
            vec!["example.com/a/sub"]
        );
    }

    #[test]
    fn overlapping_full_name_keys_have_only_one_real_candidate() {
        let mut modules = vec![
            Module::new("example.com/a", "v1.0.0", false),
            Module::new("example.com/a/sub", "v1.0.0", false),
        ];
        let files = vec!["example.com/a/sub@v1.0.0/x.go".to_string()];
        classify(&mut modules, &files).unwrap();
        assert!(modules[0].packages().is_empty());
        assert_eq!(modules[1].packages().len(), 1);
    }

    #[test]
    fn unattributed_files_are_skipped_as_stdlib() {
        let (mut modules, _) = module_cache_scenario();
        let files = vec!["/usr/local/go/src/fmt/print.go".to_string()];
        classify(&mut modules, &files).unwrap();
        assert!(modules.iter().all(|m| m.packages().is_empty()));
    }

    #[test]
    fn autogenerated_sentinel_is_always_skipped() {
        let mut modules = vec![Module::new("example.com/b", "v2.1.0", false)];
        let files = vec![AUTOGENERATED_FILE.to_string()];
        classify(&mut modules, &files).unwrap();
        assert!(modules[0].packages().is_empty());
    }
}
