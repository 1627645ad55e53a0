//! Shared fixtures: git repositories built with git2 in a temp dir
//!
//! Commit times advance by a minute per commit so walk order is deterministic.

#![allow(dead_code)]

use codegraph_lookback::GitHistoryProvider;
use git2::{Commit, Index, IndexEntry, IndexTime, Oid, Repository, Signature, Time};
use tempfile::TempDir;

pub struct GitFixture {
    pub dir: TempDir,
    pub repo: Repository,
    clock: i64,
}

impl GitFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self {
            dir,
            repo,
            clock: 1_700_000_000,
        }
    }

    /// Commit a full snapshot of `files` on top of `parents`
    pub fn commit(&mut self, files: &[(&str, &str)], parents: &[Oid]) -> Oid {
        self.clock += 60;

        let mut index = Index::new().unwrap();
        for (path, content) in files {
            let blob = self.repo.blob(content.as_bytes()).unwrap();
            index
                .add(&IndexEntry {
                    ctime: IndexTime::new(0, 0),
                    mtime: IndexTime::new(0, 0),
                    dev: 0,
                    ino: 0,
                    mode: 0o100644,
                    uid: 0,
                    gid: 0,
                    file_size: content.len() as u32,
                    id: blob,
                    flags: 0,
                    flags_extended: 0,
                    path: path.as_bytes().to_vec(),
                })
                .unwrap();
        }
        let tree_id = index.write_tree_to(&self.repo).unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let sig = Signature::new("Test", "test@example.com", &Time::new(self.clock, 0)).unwrap();
        let parents: Vec<Commit<'_>> = parents
            .iter()
            .map(|p| self.repo.find_commit(*p).unwrap())
            .collect();
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();

        self.repo
            .commit(None, &sig, &sig, "commit", &tree, &parent_refs)
            .unwrap()
    }

    pub fn branch(&self, name: &str, target: Oid) {
        self.repo
            .reference(&format!("refs/heads/{}", name), target, true, "test")
            .unwrap();
    }

    pub fn provider(&self) -> GitHistoryProvider {
        GitHistoryProvider::new().with_repository("repo", self.dir.path())
    }
}

/// c0: lib v1 | c1: readme | c2: lib v2 | c3: readme | c4: readme
pub fn linear_fixture() -> (GitFixture, Vec<String>) {
    let mut git = GitFixture::new();
    let mut ids = Vec::new();
    let mut parent: Vec<Oid> = Vec::new();
    let snapshots = [
        [("src/lib.rs", "v1"), ("README.md", "r0")],
        [("src/lib.rs", "v1"), ("README.md", "r1")],
        [("src/lib.rs", "v2"), ("README.md", "r1")],
        [("src/lib.rs", "v2"), ("README.md", "r3")],
        [("src/lib.rs", "v2"), ("README.md", "r4")],
    ];
    for files in snapshots.iter() {
        let oid = git.commit(files, &parent);
        parent = vec![oid];
        ids.push(oid.to_string());
    }
    git.branch("main", parent[0]);
    (git, ids)
}
