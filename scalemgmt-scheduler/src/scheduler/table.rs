//! Insertion-ordered job collection

use scalemgmt_core::domain::job::Job;
use scalemgmt_core::domain::request::PreparedRequest;
use std::collections::HashMap;
use uuid::Uuid;

/// Jobs keyed by id, iterated in registration order
///
/// Jobs are only ever appended, so positions in `jobs` never move.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
    index: HashMap<Uuid, usize>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, job: Job) -> Uuid {
        let id = job.id;
        self.index.insert(id, self.jobs.len());
        self.jobs.push(job);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&Job> {
        self.index.get(&id).map(|&pos| &self.jobs[pos])
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    /// Id of the job holding a request equal to `request`
    pub fn find_request(&self, request: &PreparedRequest) -> Option<Uuid> {
        self.jobs
            .iter()
            .find(|job| job.request == *request)
            .map(|job| job.id)
    }

    pub fn as_slice(&self) -> &[Job] {
        &self.jobs
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Job> {
        self.jobs.iter_mut()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.jobs.iter().map(|job| job.id).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
