//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after printing command output
pub fn redisplay_prompt(viewer_id: &str) {
    print!("{}> ", viewer_id);
    std::io::stdout().flush().ok();
}
