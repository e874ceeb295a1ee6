//! AndroidManifest.xml cleanup for the merged package
//!
//! A split base APK declares that it cannot be installed alone. Once all
//! splits are folded into one package those declarations are wrong, and the
//! Play Store stamp must say the package is standalone.

use crate::error::MergeResult;
use std::fs;
use std::path::Path;

/// Manifest file at the root of a decoded tree
pub const MANIFEST_FILE: &str = "AndroidManifest.xml";

/// Literal replacements applied in order, every occurrence
pub const MANIFEST_REPLACEMENTS: [(&str, &str); 4] = [
    (r#" android:isSplitRequired="true" "#, " "),
    (
        r#"<meta-data android:name="com.android.vending.splits.required" android:value="true"/>"#,
        "",
    ),
    (
        r#"<meta-data android:name="com.android.vending.splits" android:resource="@xml/splits0"/>"#,
        "",
    ),
    (
        r#"android:value="STAMP_TYPE_DISTRIBUTION_APK""#,
        r#"android:value="STAMP_TYPE_STANDALONE_APK""#,
    ),
];

/// Signature files left by the original signer, stale after a rebuild
pub const STALE_SIGNATURE_FILES: [&str; 3] = ["BNDLTOOL.RSA", "BNDLTOOL.SF", "MANIFEST.MF"];

/// Strip split-package markers from manifest text
pub fn patch_manifest_text(text: &str) -> String {
    MANIFEST_REPLACEMENTS
        .iter()
        .fold(text.to_string(), |data, &(from, to)| data.replace(from, to))
}

/// Rewrite the manifest at `path` in place
pub fn patch_manifest(path: &Path) -> MergeResult<()> {
    let original = fs::read_to_string(path)?;
    let patched = patch_manifest_text(&original);
    if patched == original {
        tracing::debug!("No split markers in {}", path.display());
    }
    fs::write(path, patched)?;
    Ok(())
}

/// Remove stale signature files from `<tree>/original/META-INF`.
///
/// Returns how many files were deleted; missing files are not an error.
pub fn remove_stale_signatures(tree: &Path) -> MergeResult<usize> {
    let meta_inf = tree.join("original").join("META-INF");
    let mut removed = 0;
    for name in STALE_SIGNATURE_FILES {
        let path = meta_inf.join(name);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Removed stale signature file {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}
