//! Scratch projects and a stand-in `native-image` for integration tests

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>com.example</groupId>
    <artifactId>hello</artifactId>
    <version>1.0.0</version>
    <build>
        <plugins>
            <plugin>
                <groupId>org.apache.maven.plugins</groupId>
                <artifactId>maven-jar-plugin</artifactId>
                <configuration>
                    <archive>
                        <manifest>
                            <mainClass>com.example.hello.App</mainClass>
                        </manifest>
                    </archive>
                </configuration>
            </plugin>
        </plugins>
    </build>
</project>
"#;

/// A packaged Maven project with one dependency and a fake GraalVM home
pub struct ProjectFixture {
    pub temp: TempDir,
}

impl ProjectFixture {
    /// `native-image` prints `version` and exits with `exit_code` on builds
    pub fn new(version: &str, exit_code: i32) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let fixture = Self { temp };

        fs::write(fixture.dir().join("pom.xml"), POM).expect("Failed to write pom.xml");
        fs::create_dir_all(fixture.target()).expect("Failed to create target");
        fs::create_dir_all(fixture.repo()).expect("Failed to create repository");

        write_jar(
            &fixture.target().join("hello-1.0.0.jar"),
            &[
                "com/example/hello/App.class",
                "META-INF/native-image/com.example/hello/native-image.properties",
            ],
        );
        write_jar(
            &fixture.repo().join("greeting-2.1.jar"),
            &[
                "com/example/greeting/Greeter.class",
                "META-INF/native-image/native-image.properties",
            ],
        );

        fs::write(
            fixture.dir().join("nativepack.toml"),
            format!(
                r#"[image]
image_name = "hello"
build_args = ["--no-fallback"]
compat_version = "22.3.0"

[[dependency]]
group_id = "com.example"
artifact_id = "greeting"
version = "2.1"
file = "{}"

[[dependency]]
group_id = "org.junit"
artifact_id = "junit"
version = "5.0"
scope = "test"
"#,
                fixture.repo().join("greeting-2.1.jar").display()
            ),
        )
        .expect("Failed to write nativepack.toml");

        fixture.install_native_image(version, exit_code);
        fixture
    }

    pub fn dir(&self) -> &Path {
        self.temp.path()
    }

    pub fn target(&self) -> PathBuf {
        self.dir().join("target")
    }

    pub fn repo(&self) -> PathBuf {
        self.dir().join("repo")
    }

    pub fn java_home(&self) -> PathBuf {
        self.dir().join("graalvm")
    }

    /// Arguments the fake compiler received on its build run, one per line
    pub fn recorded_args(&self) -> Option<Vec<String>> {
        let content = fs::read_to_string(self.target().join("native-image.args")).ok()?;
        Some(content.lines().map(str::to_string).collect())
    }

    #[cfg(unix)]
    fn install_native_image(&self, version: &str, exit_code: i32) {
        use std::os::unix::fs::PermissionsExt;

        let bin = self.java_home().join("lib/svm/bin");
        fs::create_dir_all(&bin).expect("Failed to create svm/bin");
        let script = bin.join("native-image");
        fs::write(
            &script,
            format!(
                r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "native-image {0}"
    echo "GraalVM Version {0} (Java Version 17.0.5+8-jvmci-22.3-b08)"
    exit 0
fi
printf '%s\n' "$@" > native-image.args
exit {1}
"#,
                version, exit_code
            ),
        )
        .expect("Failed to write native-image");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod native-image");
    }

    #[cfg(not(unix))]
    fn install_native_image(&self, _version: &str, _exit_code: i32) {}
}

pub fn write_jar(path: &Path, entries: &[&str]) {
    let mut writer = ZipWriter::new(File::create(path).expect("Failed to create jar"));
    for entry in entries {
        writer
            .start_file(*entry, SimpleFileOptions::default())
            .expect("Failed to start entry");
        writer.write_all(b"\xCA\xFE\xBA\xBE").expect("Failed to write entry");
    }
    writer.finish().expect("Failed to finish jar");
}
