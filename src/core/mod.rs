// ─── vatSys Manager Core ───
// Profile and plugin management for the vatSys ATC client.
//
// Architecture:
//   core/
//     descriptor/ — Profile.xml parsing + version identifiers
//     filesystem/ — Idempotent directory create / read-only-safe delete
//     downloader/ — Streaming archive download + zip extraction
//     catalog/    — Remote catalogs, local scans, reconciliation
//     workflow/   — Install / Update / Delete pipelines with transcripts
//     host/       — vatSys process check, stop and launch
//     state/      — Settings + application context

pub mod catalog;
pub mod descriptor;
pub mod downloader;
pub mod error;
pub mod filesystem;
pub mod host;
pub mod http;
pub mod state;
pub mod step;
pub mod workflow;
