//! Demo content for a fresh learning session.

use shellbox_types::error::Result;

use crate::engine::{FileSystem, WriteMode};
use crate::path;

const NOTES: &str = "\
Linux command notes
===================

ls      list directory contents (try ls -la)
cd      change the working directory
pwd     print the working directory
cat     print a file
mkdir   create a directory
rm      remove a file
";

const PROJECT: &str = "\
# Project

Practice navigating this sandbox. Nothing here touches a real disk,
so experiment freely: create files, move them around, delete them.
";

const BASHRC: &str = "\
# ~/.bashrc
alias ll='ls -l'
alias la='ls -A'
export PS1='\\u@\\h:\\w\\$ '
";

const PROFILE: &str = "# ~/.profile\n[ -f ~/.bashrc ] && . ~/.bashrc\n";

const PASSWD: &str = "\
root:x:0:0:root:/root:/bin/bash
favork:x:1000:1000:favork:/home/favork:/bin/bash
";

/// Populate `fs` with the demo tree and move to the home directory.
pub fn populate_demo_tree(fs: &mut FileSystem) -> Result<()> {
    for dir in ["/bin", "/etc", "/tmp", "/usr/bin", "/var/log", "/root"] {
        fs.create_directory_all(dir)?;
        fs.chown(dir, "root", Some("root"))?;
    }
    fs.chown("/usr", "root", Some("root"))?;
    fs.chown("/var", "root", Some("root"))?;

    for (file, content) in [
        ("/etc/hostname", "shellbox\n"),
        ("/etc/passwd", PASSWD),
        ("/etc/motd", "Welcome to SHELLBOX. Type 'help' to get started.\n"),
        ("/var/log/syslog", ""),
    ] {
        fs.write_file(file, content, WriteMode::Overwrite)?;
        fs.chown(file, "root", Some("root"))?;
    }

    let home = fs.resolve(fs.home());
    fs.create_directory_all(&home)?;
    let mut ancestor = home.as_str();
    while let Some((parent, _)) = path::split_parent(ancestor)
        && parent != "/"
    {
        fs.chown(parent, "root", Some("root"))?;
        ancestor = parent;
    }
    for dir in ["Documents", "Downloads", "Pictures"] {
        fs.create_directory_all(&format!("{home}/{dir}"))?;
    }
    for (file, content) in [
        ("Documents/notes.txt", NOTES),
        ("Documents/project.md", PROJECT),
        ("Documents/commands.log", ""),
        (".bashrc", BASHRC),
        (".profile", PROFILE),
    ] {
        fs.write_file(&format!("{home}/{file}"), content, WriteMode::Overwrite)?;
    }

    fs.change_directory(&home);
    log::debug!("demo tree ready: {:?}", fs.statistics());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FsOptions;

    #[test]
    fn home_is_cwd_and_user_owned() {
        let mut fs = FileSystem::in_memory(FsOptions::default());
        populate_demo_tree(&mut fs).unwrap();
        assert_eq!(fs.cwd(), "/home/favork");
        assert_eq!(fs.stat("/home/favork").unwrap().owner, "favork");
        assert_eq!(fs.stat("~/Documents/notes.txt").unwrap().owner, "favork");
    }

    #[test]
    fn system_dirs_and_home_parent_are_root_owned() {
        let mut fs = FileSystem::in_memory(FsOptions::default());
        populate_demo_tree(&mut fs).unwrap();
        for dir in ["/home", "/etc", "/usr", "/var/log"] {
            let entry = fs.stat(dir).unwrap();
            assert_eq!((entry.owner.as_str(), entry.group.as_str()), ("root", "root"), "{dir}");
        }
    }

    #[test]
    fn deep_home_ancestors_are_root_owned() {
        let opts = FsOptions {
            home: "/srv/users/ada".to_string(),
            ..FsOptions::default()
        };
        let mut fs = FileSystem::in_memory(opts);
        populate_demo_tree(&mut fs).unwrap();
        assert_eq!(fs.stat("/srv").unwrap().owner, "root");
        assert_eq!(fs.stat("/srv/users").unwrap().owner, "root");
        assert_ne!(fs.stat("/srv/users/ada").unwrap().owner, "root");
    }
}
