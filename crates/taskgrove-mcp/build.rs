use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}

fn rerun_if_changed(path: &str) {
    let p = std::path::Path::new(path);
    // Cargo expects rerun-if-changed paths relative to the crate dir; emit
    // absolute paths to sidestep the ambiguity with git-relative output.
    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(p))
            .unwrap_or_else(|_| p.to_path_buf())
    };
    println!("cargo:rerun-if-changed={}", abs.display());
}

fn main() {
    if let Some(head) = git(&["rev-parse", "--git-path", "HEAD"]) {
        rerun_if_changed(&head);
    }
    // HEAD usually points at a symbolic ref whose file changes on commit.
    if let Some(head_ref) = git(&["symbolic-ref", "-q", "HEAD"]) {
        if let Some(head_ref_path) = git(&["rev-parse", "--git-path", &head_ref]) {
            rerun_if_changed(&head_ref_path);
        }
    }
    if let Some(packed_refs) = git(&["rev-parse", "--git-path", "packed-refs"]) {
        rerun_if_changed(&packed_refs);
    }

    let sha = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "nogit".to_string());
    let count = git(&["rev-list", "--count", "HEAD"]).unwrap_or_else(|| "0".to_string());
    let dirty = match git(&["status", "--porcelain"]) {
        Some(s) if s.is_empty() => "",
        _ => ".dirty",
    };

    println!("cargo:rustc-env=TASKGROVE_GIT_SHA={}", sha);
    println!("cargo:rustc-env=TASKGROVE_GIT_COUNT={}", count);
    println!("cargo:rustc-env=TASKGROVE_GIT_DIRTY={}", dirty);
}
