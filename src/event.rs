use crate::admissions::{PolicyCatalog, PolicySearchResults, ValidationReport};
use crate::chat::client::ChatReply;
use crate::chat::Turn;
use crate::error::ClientResult;
use crate::jobs::tracker::DownloadLink;
use crate::jobs::JobsSnapshot;
use std::path::PathBuf;

/// Results delivered from runtime tasks to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    ChatReply(ClientResult<ChatReply>),
    ChatHistory(ClientResult<Vec<Turn>>),
    JobSubmitted(ClientResult<String>),
    JobsRefreshed(JobsSnapshot),
    ApplicationValidated(ClientResult<ValidationReport>),
    PoliciesLoaded(ClientResult<PolicyCatalog>),
    PolicySearchFinished {
        query: String,
        result: ClientResult<PolicySearchResults>,
    },
    DownloadFinished {
        link: DownloadLink,
        result: ClientResult<PathBuf>,
    },
}
