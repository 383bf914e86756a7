use crate::error::ZettelError;
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};

/// Map a request path to a file in the output directory.
///
/// `url_path` is percent-decoded, then must start with `url_root`. What follows is tried as a
/// file, then as a directory holding `index.html`, then with `.html` appended. Paths leaving
/// `build_dir` are never resolved.
pub async fn resolve_request(
    build_dir: &Path,
    url_root: &str,
    url_path: &str,
) -> Result<PathBuf, ZettelError> {
    let not_found = |path: &Path| ZettelError::PageNotFound {
        url: url_path.to_string(),
        path: path.display().to_string(),
        cwd: std::env::current_dir()
            .map(|cwd| cwd.display().to_string())
            .unwrap_or_default(),
    };

    let Ok(decoded) = percent_decode_str(url_path).decode_utf8() else {
        return Err(not_found(build_dir));
    };
    let root = url_root.trim_end_matches('/');
    let Some(relative) = decoded.strip_prefix(root) else {
        return Err(not_found(build_dir));
    };
    if !relative.is_empty() && !relative.starts_with('/') {
        return Err(not_found(build_dir));
    }
    let relative = Path::new(relative.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(not_found(&build_dir.join(relative)));
    }

    let path = build_dir.join(relative);
    if is_file(&path).await {
        return Ok(path);
    }
    let index = path.join("index.html");
    if is_dir(&path).await && is_file(&index).await {
        return Ok(index);
    }
    let mut pretty = path.clone().into_os_string();
    pretty.push(".html");
    let pretty = PathBuf::from(pretty);
    if is_file(&pretty).await {
        return Ok(pretty);
    }
    Err(not_found(&path))
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
