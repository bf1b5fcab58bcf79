use anyhow::Result;
use git2::{Oid, Repository, Signature, Time};
use git_histedit::engine::{Engine, EngineEvent};
use git_histedit::git::RewriteStrategy;
use git_histedit::prompt::{AcceptDefault, FixedMessage, MessageRequest};
use git_histedit::utils::Settings;
use git_histedit::{HisteditError, ValidationError};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test setup that creates a temporary git repository with test commits
struct TestRepo {
    _temp_dir: TempDir,
    repo_path: PathBuf,
    repo: Repository,
    commits: Vec<Oid>,
}

impl TestRepo {
    fn new() -> Result<Self> {
        // Create temporary directory
        let temp_dir = tempfile::tempdir()?;
        let repo_path = temp_dir.path().to_path_buf();

        // Initialize git repository
        let repo = Repository::init(&repo_path)?;

        // Configure git user for commits made by the git CLI as well
        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;
        config.set_bool("commit.gpgsign", false)?;

        Ok(TestRepo {
            _temp_dir: temp_dir,
            repo_path,
            repo,
            commits: Vec::new(),
        })
    }

    /// Builds a linear history from `subjects`, oldest first.
    fn with_commits(subjects: &[&str]) -> Result<Self> {
        let mut test_repo = Self::new()?;
        let mut content = String::new();
        for subject in subjects {
            content.push_str(subject);
            content.push('\n');
            test_repo.add_commit(subject, &content)?;
        }
        Ok(test_repo)
    }

    fn add_commit(&mut self, message: &str, content: &str) -> Result<Oid> {
        let file_path = self.repo_path.join("test.txt");
        fs::write(&file_path, content)?;

        let mut index = self.repo.index()?;
        index.add_path(std::path::Path::new("test.txt"))?;
        index.write()?;

        let signature = Signature::now("Test User", "test@example.com")?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let parent_commit = match self.commits.last() {
            Some(last_commit_id) => Some(self.repo.find_commit(*last_commit_id)?),
            None => None,
        };
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();

        let commit_id = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        self.commits.push(commit_id);
        Ok(commit_id)
    }

    /// Hash of the commit created with `subjects[index]`.
    fn hash(&self, index: usize) -> String {
        self.commits[index].to_string()
    }

    fn engine(&self) -> Result<Engine> {
        Ok(Engine::open(&self.repo_path, Settings::default())?)
    }

    fn head(&self) -> Result<git2::Commit<'_>> {
        Ok(self.repo.head()?.peel_to_commit()?)
    }

    /// Messages from the tip down, trimmed.
    fn messages(&self) -> Result<Vec<String>> {
        let mut walk = self.repo.revwalk()?;
        walk.push_head()?;
        walk.map(|oid| -> Result<String> {
            let commit = self.repo.find_commit(oid?)?;
            Ok(commit.message().unwrap_or("").trim().to_string())
        })
        .collect()
    }
}

#[test]
fn rename_tip_updates_its_message() -> Result<()> {
    let test_repo = TestRepo::with_commits(&["C", "B", "A"])?;
    let engine = test_repo.engine()?;
    let mut events = engine.subscribe();

    let outcome = engine.rename(&test_repo.hash(2)[..10], &mut FixedMessage("A renamed".into()))?;

    let head = test_repo.head()?;
    assert_eq!(head.id().to_string(), outcome.new_tip);
    assert_eq!(test_repo.messages()?, vec!["A renamed", "B", "C"]);
    assert_eq!(head.parent_id(0)?, test_repo.commits[1]);
    assert!(outcome.warnings[0].contains("force push"));
    assert_eq!(
        events.try_recv()?,
        EngineEvent::HistoryChanged {
            new_tip: outcome.new_tip.clone()
        }
    );

    println!("✅ {}", outcome.summary);
    Ok(())
}

#[test]
fn rename_below_tip_leaves_history_unchanged() -> Result<()> {
    let test_repo = TestRepo::with_commits(&["C", "B", "A"])?;
    let engine = test_repo.engine()?;

    let err = engine
        .rename(&test_repo.hash(1), &mut FixedMessage("B renamed".into()))
        .unwrap_err();

    assert!(matches!(err, HisteditError::ScopeLimit(_)));
    assert_eq!(test_repo.head()?.id(), test_repo.commits[2]);
    assert_eq!(test_repo.messages()?, vec!["A", "B", "C"]);
    Ok(())
}

#[test]
fn squash_including_tip_resets_and_commits() -> Result<()> {
    // History [A(tip), B, C]
    let test_repo = TestRepo::with_commits(&["C", "B", "A"])?;
    let original_tree = test_repo.head()?.tree_id();
    let engine = test_repo.engine()?;

    let outcome = engine.squash(&[test_repo.hash(2), test_repo.hash(1)], &mut AcceptDefault)?;

    assert_eq!(outcome.strategy, Some(RewriteStrategy::TipReset));
    let head = test_repo.head()?;
    assert_eq!(head.id().to_string(), outcome.new_tip);
    assert_eq!(head.parent_id(0)?, test_repo.commits[0]);
    assert_eq!(head.tree_id(), original_tree);
    assert_eq!(test_repo.messages()?, vec!["- B\n- A", "C"]);
    Ok(())
}

#[test]
fn squash_buried_run_folds_into_oldest() -> Result<()> {
    // History [A(tip), B, C, D]
    let test_repo = TestRepo::with_commits(&["D", "C", "B", "A"])?;
    let original_tree = test_repo.head()?.tree_id();
    let engine = test_repo.engine()?;

    // Selection order is not trusted; newest-first or not, the result is the same.
    let outcome = engine.squash(&[test_repo.hash(1), test_repo.hash(2)], &mut AcceptDefault)?;

    assert_eq!(outcome.strategy, Some(RewriteStrategy::ScriptedRebase));
    assert_eq!(test_repo.messages()?, vec!["A", "- C\n- B", "D"]);

    let head = test_repo.head()?;
    assert_eq!(head.tree_id(), original_tree);
    let folded = head.parent(0)?;
    assert_eq!(folded.parent_id(0)?, test_repo.commits[0]);
    assert_eq!(folded.tree_id(), test_repo.repo.find_commit(test_repo.commits[2])?.tree_id());
    assert!(test_repo.repo.state() == git2::RepositoryState::Clean);
    Ok(())
}

/// Commits `files` as a tree on top of `parents` at `seconds` past the epoch.
fn commit_at(
    repo: &Repository,
    update_ref: Option<&str>,
    message: &str,
    files: &[(&str, &str)],
    parents: &[Oid],
    seconds: i64,
) -> Result<Oid> {
    let mut builder = repo.treebuilder(None)?;
    for (name, content) in files {
        let blob = repo.blob(content.as_bytes())?;
        builder.insert(*name, blob, 0o100644)?;
    }
    let tree = repo.find_tree(builder.write()?)?;
    let parents = parents
        .iter()
        .map(|oid| repo.find_commit(*oid))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let parents: Vec<&git2::Commit> = parents.iter().collect();
    let signature = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0))?;
    Ok(repo.commit(update_ref, &signature, &signature, message, &tree, &parents)?)
}

#[test]
fn squash_with_merge_at_tip_keeps_the_other_parent_line() -> Result<()> {
    let test_repo = TestRepo::new()?;
    let repo = &test_repo.repo;
    let t0 = 1_700_000_000;

    // base <- mainline <- merge, and base <- side <- merge
    let base = commit_at(repo, Some("HEAD"), "base", &[("a.txt", "a\n")], &[], t0)?;
    let mainline = commit_at(
        repo,
        Some("HEAD"),
        "mainline",
        &[("a.txt", "a\nmain\n")],
        &[base],
        t0 + 10,
    )?;
    let side = commit_at(repo, None, "side", &[("a.txt", "a\n"), ("b.txt", "b\n")], &[base], t0 + 20)?;
    let merge = commit_at(
        repo,
        Some("HEAD"),
        "merge",
        &[("a.txt", "a\nmain\n"), ("b.txt", "b\n")],
        &[mainline, side],
        t0 + 30,
    )?;
    repo.checkout_head(Some(git2::build::CheckoutBuilder::new().force()))?;

    let engine = test_repo.engine()?;
    let listed: Vec<String> = engine
        .history(None)
        .commits()
        .iter()
        .map(|c| c.message.clone())
        .collect();
    assert_eq!(listed, vec!["merge", "side", "mainline", "base"]);

    let err = engine
        .squash(
            &[merge.to_string(), side.to_string()],
            &mut FixedMessage("MS".into()),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        HisteditError::Validation(ValidationError::MergeInRange(_))
    ));
    assert_eq!(test_repo.head()?.id(), merge);
    assert!(repo.find_commit(merge)?.parent_ids().any(|p| p == mainline));
    Ok(())
}

#[test]
fn squash_buried_run_uses_edited_message() -> Result<()> {
    let test_repo = TestRepo::with_commits(&["D", "C", "B", "A"])?;
    let engine = test_repo.engine()?;

    let mut offered = String::new();
    let mut prompt = |request: &MessageRequest| -> std::io::Result<Option<String>> {
        offered = request.default.clone();
        Ok(Some("Combine B and C\n\nWith a body".to_string()))
    };
    engine.squash(&[test_repo.hash(2), test_repo.hash(1)], &mut prompt)?;

    assert_eq!(offered, "- C\n- B");
    assert_eq!(
        test_repo.messages()?,
        vec!["A", "Combine B and C\n\nWith a body", "D"]
    );
    Ok(())
}

#[test]
fn non_contiguous_selection_is_rejected() -> Result<()> {
    let test_repo = TestRepo::with_commits(&["C", "B", "A"])?;
    let engine = test_repo.engine()?;

    let err = engine
        .squash(&[test_repo.hash(2), test_repo.hash(0)], &mut AcceptDefault)
        .unwrap_err();

    assert!(matches!(
        err,
        HisteditError::Validation(ValidationError::NonConsecutive { .. })
    ));
    assert_eq!(test_repo.head()?.id(), test_repo.commits[2]);
    assert_eq!(test_repo.messages()?, vec!["A", "B", "C"]);
    Ok(())
}

#[test]
fn cancelled_message_leaves_history_unchanged() -> Result<()> {
    let test_repo = TestRepo::with_commits(&["C", "B", "A"])?;
    let engine = test_repo.engine()?;
    let mut events = engine.subscribe();

    let err = engine
        .squash(&[test_repo.hash(2), test_repo.hash(1)], &mut FixedMessage("  \n".into()))
        .unwrap_err();

    assert!(err.is_abandoned());
    assert_eq!(test_repo.head()?.id(), test_repo.commits[2]);
    assert!(events.try_recv().is_err());
    Ok(())
}

#[test]
fn buried_squash_refuses_dirty_tree() -> Result<()> {
    let test_repo = TestRepo::with_commits(&["D", "C", "B", "A"])?;
    fs::write(test_repo.repo_path.join("test.txt"), "uncommitted\n")?;
    let engine = test_repo.engine()?;

    let err = engine
        .squash(&[test_repo.hash(1), test_repo.hash(2)], &mut AcceptDefault)
        .unwrap_err();

    assert!(matches!(
        err,
        HisteditError::Validation(ValidationError::DirtyWorkingTree)
    ));
    assert_eq!(test_repo.messages()?, vec!["A", "B", "C", "D"]);
    Ok(())
}

#[test]
fn listing_is_stable_and_decorated() -> Result<()> {
    let test_repo = TestRepo::with_commits(&["C", "B", "A"])?;
    let engine = test_repo.engine()?;

    let first = engine.history(None);
    let second = engine.history(None);

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    let tip = first.tip().unwrap();
    assert_eq!(tip.hash, test_repo.hash(2));
    assert_eq!(tip.message, "A");
    assert!(tip.refs.iter().any(|r| r.starts_with("HEAD -> ")));
    assert_eq!(tip.author, "Test User");
    assert_eq!(engine.history(Some(2)).len(), 2);
    Ok(())
}

#[test]
fn history_of_non_repository_is_empty() -> Result<()> {
    let test_repo = TestRepo::with_commits(&["A"])?;
    let engine = test_repo.engine()?;
    fs::remove_dir_all(test_repo.repo_path.join(".git"))?;

    assert!(engine.history(None).is_empty());
    Ok(())
}
