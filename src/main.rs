//! xcarchive_export - exports Xcode archives with resolved code signing.
//!
//! This binary writes the export options for an `.xcarchive`, runs
//! `xcodebuild -exportArchive` and copies the results to the deploy directory.

use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let exit_code = match xcarchive_export::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  • {}", suggestion);
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
