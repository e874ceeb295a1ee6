//! Shared fixtures: fake APKs and a fake toolchain
//!
//! A fake APK is a zip archive whose entries are exactly the files apktool
//! would decode it to, so "decoding" is an extract and "building" zips the
//! tree back up.

#![allow(dead_code)]

use mergeapks::{built_artifact_path, MergeError, MergeResult, SigningConfig, Toolchain};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const BASE_APKTOOL_YML: &str = "!!brut.androlib.meta.MetaInfo
apkFileName: base.apk
compressionType: false
doNotCompress:
- arsc
- png
isFrameworkApk: false
sdkInfo:
  minSdkVersion: '24'
  targetSdkVersion: '34'
version: 2.9.3
";

pub const SPLIT_APKTOOL_YML: &str = "!!brut.androlib.meta.MetaInfo
apkFileName: split_config.de.apk
compressionType: false
doNotCompress:
- arsc
- so
isFrameworkApk: false
version: 2.9.3
";

pub const BASE_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?><manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <application android:label="@string/app_name" android:isSplitRequired="true" android:icon="@mipmap/ic_launcher">
        <meta-data android:name="com.android.vending.splits.required" android:value="true"/>
        <meta-data android:name="com.android.stamp.type" android:value="STAMP_TYPE_DISTRIBUTION_APK"/>
        <meta-data android:name="com.android.vending.splits" android:resource="@xml/splits0"/>
    </application>
</manifest>
"#;

pub const SPLIT_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?><manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app" split="config.de"/>
"#;

/// Write a fake APK with the given `(path, contents)` entries
pub fn write_apk(path: &Path, files: &[(&str, &str)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, contents) in files {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

/// Read every entry of a fake APK as text
pub fn read_apk(path: &Path) -> BTreeMap<String, String> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        entries.insert(file.name().to_string(), contents);
    }
    entries
}

/// Base package with a default string table and stale signature files
pub fn write_base_apk(path: &Path) {
    write_apk(
        path,
        &[
            ("apktool.yml", BASE_APKTOOL_YML),
            ("AndroidManifest.xml", BASE_MANIFEST),
            ("res/values/strings.xml", "<resources>base</resources>"),
            ("original/META-INF/BNDLTOOL.RSA", "rsa"),
            ("original/META-INF/BNDLTOOL.SF", "sf"),
            ("original/META-INF/MANIFEST.MF", "mf"),
        ],
    );
}

/// German locale split that also carries a conflicting default string table
pub fn write_locale_split_apk(path: &Path) {
    write_apk(
        path,
        &[
            ("apktool.yml", SPLIT_APKTOOL_YML),
            ("AndroidManifest.xml", SPLIT_MANIFEST),
            ("res/values/strings.xml", "<resources>split</resources>"),
            ("res/values-de/strings.xml", "<resources>de</resources>"),
            ("smali/Ignored.smali", "not merged"),
        ],
    );
}

/// Toolchain that extracts and zips fake APKs instead of running apktool
#[derive(Debug, Default)]
pub struct FakeToolchain {
    /// Calls in order, e.g. `decode 01-base.apk`
    pub calls: RefCell<Vec<String>>,
    /// Fail decoding any archive whose name contains this
    pub fail_decode_of: Option<String>,
    /// Report a successful build without writing the artifact
    pub omit_build_output: bool,
}

impl FakeToolchain {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

impl Toolchain for FakeToolchain {
    fn decode(&self, archive: &Path, out_dir: &Path) -> MergeResult<()> {
        let name = file_name(archive);
        self.record(format!("decode {}", name));
        if matches!(self.fail_decode_of, Some(ref pattern) if name.contains(pattern.as_str())) {
            return Err(MergeError::Decode(archive.to_path_buf()));
        }

        let mut zip = ZipArchive::new(File::open(archive)?).map_err(std::io::Error::other)?;
        zip.extract(out_dir).map_err(std::io::Error::other)?;
        Ok(())
    }

    fn build(&self, tree: &Path) -> MergeResult<std::path::PathBuf> {
        self.record(format!("build {}", file_name(tree)));
        let artifact = built_artifact_path(tree);
        if self.omit_build_output {
            return Ok(artifact);
        }

        let files: Vec<(String, String)> = WalkDir::new(tree)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let relative = entry.path().strip_prefix(tree).unwrap();
                let name = relative.to_string_lossy().replace('\\', "/");
                (name, fs::read_to_string(entry.path()).unwrap())
            })
            .filter(|(name, _)| !name.starts_with("dist/"))
            .collect();

        fs::create_dir_all(artifact.parent().unwrap())?;
        let borrowed: Vec<(&str, &str)> = files
            .iter()
            .map(|(name, contents)| (name.as_str(), contents.as_str()))
            .collect();
        write_apk(&artifact, &borrowed);
        Ok(artifact)
    }

    fn align(&self, input: &Path, output: &Path) -> MergeResult<()> {
        self.record(format!("align {} {}", file_name(input), file_name(output)));
        fs::copy(input, output)?;
        Ok(())
    }

    fn sign(&self, artifact: &Path, signing: &SigningConfig) -> MergeResult<()> {
        self.record(format!("sign {} {}", file_name(artifact), signing.key_alias));
        Ok(())
    }
}
