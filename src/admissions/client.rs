use crate::admissions::{Command, PolicyCatalog, PolicySearchResults, ValidationReport};
use crate::error::{check_status, ClientError, ClientResult};
use crate::event::AppEvent;
use crate::jobs::tracker::DownloadLink;
use crate::jobs::JobsSnapshot;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;

#[derive(Debug, Deserialize)]
struct JobCreated {
    job_id: String,
}

#[async_trait]
pub trait AdmissionsBackend: Send + Sync {
    async fn submit_command(&self, command: &Command) -> ClientResult<String>;

    async fn jobs(&self) -> ClientResult<JobsSnapshot>;

    async fn application_data(&self) -> ClientResult<Value>;

    async fn validate_application(&self, data: &Value) -> ClientResult<ValidationReport>;

    async fn policies(&self) -> ClientResult<PolicyCatalog>;

    async fn search_policies(&self, query: &str) -> ClientResult<PolicySearchResults>;

    /// Streams the job's output into `dest_dir` and returns the written path.
    async fn download(&self, link: &DownloadLink, dest_dir: &Path) -> ClientResult<PathBuf>;
}

pub struct HttpAdmissionsBackend {
    base_url: String,
    http: reqwest::Client,
}

impl HttpAdmissionsBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("studentdesk/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl AdmissionsBackend for HttpAdmissionsBackend {
    async fn submit_command(&self, command: &Command) -> ClientResult<String> {
        let response = self.http.post(self.url("/command")).json(command).send().await?;
        let created = check_status(response).await?.json::<JobCreated>().await?;
        tracing::info!(job_id = %created.job_id, "job created");
        Ok(created.job_id)
    }

    async fn jobs(&self) -> ClientResult<JobsSnapshot> {
        let response = self.http.get(self.url("/jobs")).send().await?;
        let map = check_status(response)
            .await?
            .json::<Map<String, Value>>()
            .await?;
        Ok(JobsSnapshot::from_map(map)?)
    }

    async fn application_data(&self) -> ClientResult<Value> {
        let response = self.http.get(self.url("/application/data")).send().await?;
        let data = check_status(response).await?.json::<Value>().await?;
        if let Some(error) = data.get("error").and_then(Value::as_str) {
            return Err(ClientError::Server(error.to_string()));
        }
        Ok(data)
    }

    async fn validate_application(&self, data: &Value) -> ClientResult<ValidationReport> {
        let response = self
            .http
            .post(self.url("/validate/application"))
            .json(data)
            .send()
            .await?;
        Ok(check_status(response).await?.json::<ValidationReport>().await?)
    }

    async fn policies(&self) -> ClientResult<PolicyCatalog> {
        let response = self.http.get(self.url("/policies")).send().await?;
        let catalog = check_status(response).await?.json::<PolicyCatalog>().await?;
        if let Some(error) = &catalog.error {
            return Err(ClientError::Server(
                catalog.message.clone().unwrap_or_else(|| error.clone()),
            ));
        }
        Ok(catalog)
    }

    async fn search_policies(&self, query: &str) -> ClientResult<PolicySearchResults> {
        let response = self
            .http
            .get(self.url("/policies/search"))
            .query(&[("q", query)])
            .send()
            .await?;
        let results = check_status(response)
            .await?
            .json::<PolicySearchResults>()
            .await?;
        if let Some(error) = results.error {
            return Err(ClientError::Server(error));
        }
        Ok(results)
    }

    async fn download(&self, link: &DownloadLink, dest_dir: &Path) -> ClientResult<PathBuf> {
        let url = self.url(&format!("/download/{}", link.job_id));
        let response = check_status(self.http.get(url).send().await?).await?;

        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(sanitize_filename(&link.filename));
        let mut file = tokio::fs::File::create(&path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        tracing::info!(job_id = %link.job_id, path = %path.display(), "download saved");
        Ok(path)
    }
}

fn sanitize_filename(raw: &str) -> String {
    let name = Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == ".." {
        "document".to_string()
    } else {
        name.to_string()
    }
}

/// Spawns admissions round-trips on the runtime; results come back as [`AppEvent`]s.
#[derive(Clone)]
pub struct AdmissionsClient {
    backend: Arc<dyn AdmissionsBackend>,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
}

impl AdmissionsClient {
    pub fn new(
        backend: Arc<dyn AdmissionsBackend>,
        tx: mpsc::Sender<AppEvent>,
        runtime_handle: Handle,
    ) -> Self {
        Self {
            backend,
            tx,
            runtime_handle,
        }
    }

    pub fn submit(&self, command: Command) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let result = backend.submit_command(&command).await;
            let _ = tx.send(AppEvent::JobSubmitted(result));
        });
    }

    /// Fetches the stored application and runs it through the validator.
    pub fn validate(&self) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let result = match backend.application_data().await {
                Ok(data) => backend.validate_application(&data).await,
                Err(err) => Err(err),
            };
            let _ = tx.send(AppEvent::ApplicationValidated(result));
        });
    }

    pub fn load_policies(&self) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let result = backend.policies().await;
            let _ = tx.send(AppEvent::PoliciesLoaded(result));
        });
    }

    pub fn search_policies(&self, query: String) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let result = backend.search_policies(&query).await;
            let _ = tx.send(AppEvent::PolicySearchFinished { query, result });
        });
    }

    pub fn download(&self, link: DownloadLink, dest_dir: PathBuf) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let result = backend.download(&link, &dest_dir).await;
            let _ = tx.send(AppEvent::DownloadFinished { link, result });
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory admissions server for tests.
    #[derive(Default)]
    pub struct ScriptedAdmissionsBackend {
        jobs: Mutex<JobsSnapshot>,
        jobs_calls: AtomicUsize,
        pub submitted: Mutex<Vec<Command>>,
    }

    impl ScriptedAdmissionsBackend {
        pub fn jobs(self, snapshot: JobsSnapshot) -> Self {
            *self.jobs.lock().expect("jobs lock should not be poisoned") = snapshot;
            self
        }

        pub fn jobs_calls(&self) -> usize {
            self.jobs_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AdmissionsBackend for ScriptedAdmissionsBackend {
        async fn submit_command(&self, command: &Command) -> ClientResult<String> {
            let mut submitted = self.submitted.lock().expect("submitted lock should not be poisoned");
            submitted.push(command.clone());
            Ok(format!("job-{}", submitted.len()))
        }

        async fn jobs(&self) -> ClientResult<JobsSnapshot> {
            self.jobs_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.jobs.lock().expect("jobs lock should not be poisoned").clone())
        }

        async fn application_data(&self) -> ClientResult<Value> {
            Ok(serde_json::json!({"program": "BSCS"}))
        }

        async fn validate_application(&self, _data: &Value) -> ClientResult<ValidationReport> {
            Ok(ValidationReport {
                is_valid: true,
                ..ValidationReport::default()
            })
        }

        async fn policies(&self) -> ClientResult<PolicyCatalog> {
            Ok(PolicyCatalog::default())
        }

        async fn search_policies(&self, _query: &str) -> ClientResult<PolicySearchResults> {
            Ok(PolicySearchResults::default())
        }

        async fn download(&self, link: &DownloadLink, dest_dir: &Path) -> ClientResult<PathBuf> {
            Ok(dest_dir.join(&link.filename))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admissions::LoginForm;
    use testing::ScriptedAdmissionsBackend;

    #[test]
    fn download_names_cannot_escape_the_target_dir() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("report.docx"), "report.docx");
        assert_eq!(sanitize_filename(""), "document");
        assert_eq!(sanitize_filename(".."), "document");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn submit_reports_created_job_over_channel() {
        let backend = Arc::new(ScriptedAdmissionsBackend::default());
        let (tx, rx) = mpsc::channel();
        let client = AdmissionsClient::new(backend.clone(), tx, Handle::current());

        let form = LoginForm {
            email: "a@b.pk".to_string(),
            password: "pw".to_string(),
            remember: false,
        };
        client.submit(form.command().expect("form is complete"));

        let event = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(2)))
            .await
            .expect("blocking task should join")
            .expect("event should arrive");
        match event {
            AppEvent::JobSubmitted(Ok(job_id)) => assert_eq!(job_id, "job-1"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(
            backend.submitted.lock().expect("submitted lock should not be poisoned").len(),
            1
        );
    }
}
