//! Module-Info Parser: splits the textual module-info blob recovered by
//! the Build-Info Decoder into the binary's name and its module list.

use crate::model::Module;
use log::debug;

/// `name + "@" + <path-directive>` for binaries whose `mod` line is absent
/// or names something other than `mod`, i.e. binaries from the Go
/// toolchain itself.
const GO_DISTRIBUTION_PREFIX: &str = "go-distribution@";

/// Parses the module-info blob into `(binary name, modules)`.
///
/// Line 0 is `path\t<import-path>`. Line 1 is either `mod\t<main>\t<version>`
/// (a user module binary) or something else (a Go-distribution binary, in
/// which case the binary name becomes `"go-distribution@" + <path>`).
/// Remaining lines are `dep`/`=>` records; only fields [1] and [2] are
/// taken, and lines with an empty name or version are skipped.
pub fn parse(blob: &str) -> (String, Vec<Module>) {
    let mut lines = blob.lines();

    let path_directive = lines
        .next()
        .and_then(|line| line.split('\t').nth(1))
        .unwrap_or("")
        .to_string();

    let mut modules = Vec::new();
    let mut name = format!("{GO_DISTRIBUTION_PREFIX}{path_directive}");

    if let Some(mod_line) = lines.next() {
        let fields: Vec<&str> = mod_line.split('\t').collect();
        if fields.first() == Some(&"mod") {
            let main_name = fields.get(1).copied().unwrap_or("");
            let main_version = fields.get(2).copied().unwrap_or("");
            name = main_name.to_string();
            modules.push(Module::new(main_name, main_version, true));
        } else {
            debug!("module-info has no `mod` line; treating as a Go-distribution binary");
        }
    }

    for line in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        let dep_name = fields.get(1).copied().unwrap_or("");
        let dep_version = fields.get(2).copied().unwrap_or("");
        if dep_name.is_empty() || dep_version.is_empty() {
            continue;
        }
        modules.push(Module::new(dep_name, dep_version, false));
    }

    (name, modules)
}
