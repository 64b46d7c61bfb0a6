//! Command lines for the native-image compiler and its version probe

use super::identity::ContainerUser;
use super::volumes::VolumeMapping;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A finished command line: program followed by its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildCommand {
    argv: Vec<String>,
}

impl BuildCommand {
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.argv
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.argv.clone()
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// How to start the compiler inside a container
#[derive(Debug, Clone, Copy)]
pub struct ContainerInvocation<'a> {
    pub runtime: &'a str,
    pub workdir: Option<&'a Path>,
    pub user: Option<ContainerUser>,
    pub volumes: &'a [VolumeMapping],
    pub entry_point: Option<&'a str>,
    pub image: &'a str,
}

impl<'a> ContainerInvocation<'a> {
    /// Bare invocation without workdir, user or mounts, as used for probing
    pub fn bare(runtime: &'a str, image: &'a str, entry_point: Option<&'a str>) -> Self {
        Self {
            runtime,
            workdir: None,
            user: None,
            volumes: &[],
            entry_point,
            image,
        }
    }
}

/// Assembles a [`BuildCommand`] from a prefix, the classpath pair and the
/// compiler arguments, in that order
#[derive(Debug)]
pub struct CommandBuilder {
    argv: Vec<String>,
}

impl CommandBuilder {
    pub fn from_prefix<I, S>(prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: prefix.into_iter().map(Into::into).collect(),
        }
    }

    pub fn local(executable: &Path) -> Self {
        Self::from_prefix([executable.display().to_string()])
    }

    /// `<runtime> container run [--workdir W] [--user U] [-v V]... --rm [--entrypoint E] <image>`
    pub fn container(invocation: &ContainerInvocation<'_>) -> Self {
        let mut argv = vec![
            invocation.runtime.to_string(),
            "container".to_string(),
            "run".to_string(),
        ];
        if let Some(workdir) = invocation.workdir {
            argv.push("--workdir".to_string());
            argv.push(workdir.display().to_string());
        }
        if let Some(user) = invocation.user {
            argv.push("--user".to_string());
            argv.push(user.to_string());
        }
        for volume in invocation.volumes {
            argv.push("-v".to_string());
            argv.push(volume.to_string());
        }
        argv.push("--rm".to_string());
        if let Some(entry_point) = invocation.entry_point {
            argv.push("--entrypoint".to_string());
            argv.push(entry_point.to_string());
        }
        argv.push(invocation.image.to_string());
        Self { argv }
    }

    pub fn classpath(mut self, classpath: &str) -> Self {
        self.argv.push("-cp".to_string());
        self.argv.push(classpath.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn finish(self) -> BuildCommand {
        BuildCommand { argv: self.argv }
    }
}

/// Compiler arguments: user arguments split on whitespace, then `-H:Class`
/// and `-H:Name`
pub fn compiler_args(
    build_args: &[String],
    main_class: Option<&str>,
    image_name: Option<&str>,
) -> Vec<String> {
    let mut args: Vec<String> = build_args
        .iter()
        .flat_map(|entry| entry.split_whitespace())
        .map(str::to_string)
        .collect();

    if let Some(main_class) = main_class.filter(|m| *m != ".") {
        args.push(format!("-H:Class={}", main_class));
    }
    if let Some(image_name) = image_name {
        args.push(format!("-H:Name={}", image_name));
    }
    args
}
