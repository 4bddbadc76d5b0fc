use std::fs;
use std::path::Path;
use tempfile::tempdir;

use fs_lifecycle::{
    CancellationToken, DeleteOptions, FsError, delete_directory, delete_file, delete_path,
};

fn make_readonly(p: &Path) {
    let mut perms = fs::metadata(p).unwrap().permissions();
    perms.set_readonly(true);
    fs::set_permissions(p, perms).unwrap();
}

/// root/{a/b/c, a/d, e} with files at every level; some read-only.
fn build_tree(root: &Path) {
    for d in ["a/b/c", "a/d", "e"] {
        fs::create_dir_all(root.join(d)).unwrap();
    }
    for (i, d) in ["", "a", "a/b", "a/b/c", "a/d", "e"].iter().enumerate() {
        for j in 0..5 {
            let f = root.join(d).join(format!("f_{i}_{j}.txt"));
            fs::write(&f, format!("{i}:{j}")).unwrap();
            if j % 2 == 0 {
                make_readonly(&f);
            }
        }
    }
}

#[test]
fn deleting_missing_paths_is_a_noop() {
    let td = tempdir().unwrap();
    let missing = td.path().join("does_not_exist");
    let token = CancellationToken::new();
    delete_directory(&missing, &DeleteOptions::default(), &token).unwrap();
    delete_file(&missing, &token).unwrap();
    delete_path(&missing, &token).unwrap();
    assert!(!missing.exists());
}

#[test]
fn deletes_nested_tree_with_readonly_files() {
    let td = tempdir().unwrap();
    let root = td.path().join("tree");
    build_tree(&root);
    make_readonly(&root.join("a/b/c/f_3_0.txt"));

    delete_directory(&root, &DeleteOptions::default(), &CancellationToken::new()).unwrap();

    assert!(!root.exists(), "root must be removed");
    assert!(td.path().exists(), "parent must survive");
}

#[test]
fn contents_only_keeps_the_root() {
    let td = tempdir().unwrap();
    let root = td.path().join("tree");
    build_tree(&root);

    delete_directory(&root, &DeleteOptions::contents_only(), &CancellationToken::new()).unwrap();

    assert!(root.is_dir());
    assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
}

#[test]
fn dedicated_worker_pool_deletes_tree() {
    let td = tempdir().unwrap();
    let root = td.path().join("tree");
    build_tree(&root);
    let opts = DeleteOptions {
        workers: Some(2),
        ..DeleteOptions::default()
    };
    delete_directory(&root, &opts, &CancellationToken::new()).unwrap();
    assert!(!root.exists());
}

#[test]
fn delete_directory_ignores_plain_files() {
    let td = tempdir().unwrap();
    let f = td.path().join("file.txt");
    fs::write(&f, b"x").unwrap();
    delete_directory(&f, &DeleteOptions::default(), &CancellationToken::new()).unwrap();
    assert!(f.exists(), "directory delete must leave a file alone");
}

#[test]
fn delete_file_clears_readonly() {
    let td = tempdir().unwrap();
    let f = td.path().join("ro.txt");
    fs::write(&f, b"x").unwrap();
    make_readonly(&f);
    delete_file(&f, &CancellationToken::new()).unwrap();
    assert!(!f.exists());
}

#[test]
fn delete_file_rejects_directories() {
    let td = tempdir().unwrap();
    let err = delete_file(td.path(), &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, FsError::InvalidArgument(_)), "got {err:?}");
}

#[test]
fn delete_path_handles_files_and_directories() {
    let td = tempdir().unwrap();
    let token = CancellationToken::new();

    let f = td.path().join("plain.txt");
    fs::write(&f, b"x").unwrap();
    delete_path(&f, &token).unwrap();
    assert!(!f.exists());

    let d = td.path().join("dir");
    build_tree(&d);
    delete_path(&d, &token).unwrap();
    assert!(!d.exists());
}

#[test]
fn cancelled_token_surfaces_cancelled_and_leaves_tree() {
    let td = tempdir().unwrap();
    let root = td.path().join("tree");
    build_tree(&root);
    let token = CancellationToken::new();
    token.cancel();

    let err = delete_directory(&root, &DeleteOptions::default(), &token).unwrap_err();
    assert!(err.is_cancelled());
    assert!(root.join("a/b/c").is_dir());
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::{PermissionsExt, symlink};

    #[test]
    fn symlink_pointing_outside_is_removed_as_a_unit() {
        let td = tempdir().unwrap();
        let outside = td.path().join("outside");
        fs::create_dir_all(outside.join("keep")).unwrap();
        fs::write(outside.join("keep/precious.txt"), b"keep me").unwrap();

        let root = td.path().join("tree");
        build_tree(&root);
        symlink(&outside, root.join("a/b/link_out")).unwrap();
        symlink(outside.join("keep/precious.txt"), root.join("e/file_link")).unwrap();

        delete_directory(&root, &DeleteOptions::default(), &CancellationToken::new()).unwrap();

        assert!(!root.exists());
        assert_eq!(
            fs::read_to_string(outside.join("keep/precious.txt")).unwrap(),
            "keep me",
            "link target must be untouched"
        );
    }

    #[test]
    fn dangling_and_chained_symlinks_are_removed() {
        let td = tempdir().unwrap();
        let root = td.path().join("tree");
        build_tree(&root);
        let target = td.path().join("target_dir");
        fs::create_dir(&target).unwrap();
        symlink(&target, root.join("first")).unwrap();
        symlink(root.join("first"), root.join("a/second")).unwrap();
        symlink(td.path().join("nowhere"), root.join("e/dangling")).unwrap();

        delete_directory(&root, &DeleteOptions::default(), &CancellationToken::new()).unwrap();

        assert!(!root.exists());
        assert!(target.is_dir());
    }

    #[test]
    fn root_symlink_is_unlinked_not_followed() {
        let td = tempdir().unwrap();
        let target = td.path().join("real");
        build_tree(&target);
        let link = td.path().join("link");
        symlink(&target, &link).unwrap();

        delete_directory(&link, &DeleteOptions::default(), &CancellationToken::new()).unwrap();

        assert!(fs::symlink_metadata(&link).is_err(), "link must be gone");
        assert!(target.join("a/b/c").is_dir(), "target tree must survive");
    }

    #[test]
    fn contents_only_through_symlink_is_refused() {
        let td = tempdir().unwrap();
        let target = td.path().join("real");
        build_tree(&target);
        let link = td.path().join("link");
        symlink(&target, &link).unwrap();

        let opts = DeleteOptions::contents_only();
        let err = delete_directory(&link, &opts, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, FsError::InvalidArgument(_)));
        assert!(target.join("a/d").is_dir());
    }

    fn mode_of(p: &Path) -> u32 {
        fs::metadata(p).unwrap().permissions().mode() & 0o777
    }

    fn running_as_root() -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    /// A subdirectory that can be entered for writing but not listed.
    fn add_unlistable_dir(root: &Path) -> std::path::PathBuf {
        let locked = root.join("a/locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("inner.txt"), b"inner").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        locked
    }

    #[test]
    fn readonly_root_and_directories_gain_owner_write() {
        let td = tempdir().unwrap();
        let root = td.path().join("tree");
        build_tree(&root);
        for d in ["a/b/c", "a/b", "a", ""] {
            fs::set_permissions(root.join(d), fs::Permissions::from_mode(0o555)).unwrap();
        }

        delete_directory(&root, &DeleteOptions::contents_only(), &CancellationToken::new())
            .unwrap();

        assert_eq!(mode_of(&root), 0o755, "root keeps r-x and gains owner write");
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn readonly_root_is_deleted_outright() {
        let td = tempdir().unwrap();
        let root = td.path().join("tree");
        build_tree(&root);
        fs::set_permissions(root.join("a"), fs::Permissions::from_mode(0o555)).unwrap();
        fs::set_permissions(&root, fs::Permissions::from_mode(0o555)).unwrap();

        delete_directory(&root, &DeleteOptions::default(), &CancellationToken::new()).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn continue_on_error_deletes_everything_else() {
        // Skip if running as root; root lists directories regardless of mode bits.
        if running_as_root() {
            eprintln!("skipping: running as root");
            return;
        }
        let td = tempdir().unwrap();
        let root = td.path().join("tree");
        build_tree(&root);
        let locked = add_unlistable_dir(&root);

        let opts = DeleteOptions {
            contents_only: true,
            continue_on_error: true,
            ..DeleteOptions::default()
        };
        delete_directory(&root, &opts, &CancellationToken::new()).unwrap();

        // The walk was normalized up to the unlistable directory; the drain
        // phase could not remove it or its parent and went on.
        assert_eq!(mode_of(&locked) & 0o200, 0o200);
        let left: Vec<_> = fs::read_dir(&root).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(left, vec!["a"]);
        let under_a: Vec<_> =
            fs::read_dir(root.join("a")).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(under_a, vec!["locked"]);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(locked.join("inner.txt").exists());
    }

    #[test]
    fn first_failure_is_returned_without_continue_on_error() {
        if running_as_root() {
            eprintln!("skipping: running as root");
            return;
        }
        let td = tempdir().unwrap();
        let root = td.path().join("tree");
        build_tree(&root);
        let locked = add_unlistable_dir(&root);

        let err = delete_directory(&root, &DeleteOptions::default(), &CancellationToken::new())
            .unwrap_err();

        assert!(matches!(err, FsError::PermissionDenied { .. }), "got {err:?}");
        assert_eq!(err.path(), Some(locked.as_path()));
        assert!(root.exists(), "a failed delete keeps the root");

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

#[test]
fn cancelling_during_delete_stops_with_entries_left() {
    use std::thread;

    const FILES: usize = 10_000;
    let td = tempdir().unwrap();
    let root = td.path().join("big");
    fs::create_dir(&root).unwrap();
    for i in 0..FILES {
        fs::write(root.join(format!("f{i:05}")), b"x").unwrap();
    }

    let token = CancellationToken::new();
    let canceller = token.clone();
    let watched = root.clone();
    // Cancel as soon as the first file is observed gone.
    let watcher = thread::spawn(move || {
        while fs::read_dir(&watched).map(|d| d.count()).unwrap_or(0) >= FILES {
            thread::yield_now();
        }
        canceller.cancel();
    });

    let opts = DeleteOptions {
        workers: Some(1),
        ..DeleteOptions::default()
    };
    let err = delete_directory(&root, &opts, &token).unwrap_err();
    watcher.join().unwrap();

    assert!(err.is_cancelled(), "got {err:?}");
    assert!(root.is_dir());
    let left = fs::read_dir(&root).unwrap().count();
    assert!(left > 0 && left < FILES, "left = {left}");
}
