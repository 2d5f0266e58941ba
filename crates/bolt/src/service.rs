//! The operations boltdesk offers on top of bolt.
//!
//! Lookups (inventory, facts, task catalog) are cached and always fail with a
//! typed error. Runs (commands, tasks, puppet, packages) are never cached and
//! split failures in two: a failure the classifier recognises is returned as
//! that error, anything else comes back as a failed [`ExecutionResult`].

use crate::args::{self, BoltArgs};
use crate::classifier::{classify, FailureContext};
use crate::parser::parse_output;
use crate::runner::{
    render_command_line, ExecOptions, OutputSink, ProcessRunner, SystemProcessRunner,
};
use crate::transform::{
    command_results, task_results, transform_facts, transform_inventory, transform_task_details,
    transform_task_list,
};
use boltdesk_cache::{ExecutionCache, ExecutionCacheStats};
use boltdesk_config::BoltConfig;
use boltdesk_core::{
    Error, ExecutionResult, ExecutionType, Facts, Node, NodeResult, NodeStatus, Result, Task,
};
use boltdesk_utils::{cache_event, execution_completed, operation_span};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

type ResultTransform = fn(&Value, &str, u64) -> Vec<NodeResult>;

/// Options for a puppet agent run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PuppetRunOptions {
    pub noop: bool,
    pub no_noop: bool,
    pub tags: Vec<String>,
    pub environment: Option<String>,
    pub debug: bool,
}

impl PuppetRunOptions {
    /// Task parameters for the puppet agent task; unset options are omitted
    pub fn to_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        if self.noop {
            params.insert("noop".into(), Value::Bool(true));
        }
        if self.no_noop {
            params.insert("no_noop".into(), Value::Bool(true));
        }
        if !self.tags.is_empty() {
            params.insert("tags".into(), Value::String(self.tags.join(",")));
        }
        if let Some(environment) = self.environment.as_deref().filter(|e| !e.is_empty()) {
            params.insert("environment".into(), Value::String(environment.to_string()));
        }
        if self.debug {
            params.insert("debug".into(), Value::Bool(true));
        }
        params
    }
}

/// A package to install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    pub name: String,
    pub version: Option<String>,
}

impl PackageRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn to_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("action".into(), Value::String("install".into()));
        params.insert("name".into(), Value::String(self.name.clone()));
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            params.insert("version".into(), Value::String(version.to_string()));
        }
        params
    }
}

/// Everything one run needs besides the runner
struct RunPlan<'a> {
    execution_type: ExecutionType,
    node_id: &'a str,
    action: String,
    parameters: Option<Map<String, Value>>,
    args: BoltArgs,
    context: FailureContext,
    transform: ResultTransform,
}

/// Orchestrates bolt invocations, their parsing and the caches
pub struct BoltService {
    runner: Arc<dyn ProcessRunner>,
    cache: ExecutionCache,
    config: BoltConfig,
}

impl BoltService {
    /// A service that spawns the configured bolt binary
    pub fn new(config: BoltConfig) -> Self {
        let runner = Arc::new(SystemProcessRunner::from_config(&config));
        Self::with_runner(config, runner)
    }

    pub fn with_runner(config: BoltConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            cache: ExecutionCache::new(config.cache),
            config,
        }
    }

    pub fn config(&self) -> &BoltConfig {
        &self.config
    }

    fn command_line(&self, args: &[String]) -> String {
        render_command_line(&self.config.binary, args)
    }

    /// Classify a failure and log the typed ones
    fn classified(&self, error: Error, context: &FailureContext) -> Error {
        let error = classify(error, context);
        if !error.is_generic_execution() {
            warn!(
                code = error.code(),
                operation = %context.operation,
                error = %error,
                "bolt call failed"
            );
        }
        error
    }

    /// Run a lookup and decode its JSON output
    async fn query(&self, args: Vec<String>, context: &FailureContext) -> Result<Value> {
        let raw = self
            .runner
            .execute(&args, &ExecOptions::default(), None)
            .await
            .map_err(|e| self.classified(e, context))?;

        if !raw.success {
            return Err(self.classified(raw.into_error(), context));
        }
        parse_output(&raw.stdout)
    }

    /// All inventory targets
    pub async fn list_inventory(&self) -> Result<Vec<Node>> {
        if let Some(nodes) = self.cache.inventory() {
            cache_event("inventory", "all", true);
            return Ok(nodes);
        }
        cache_event("inventory", "all", false);

        let nodes = self
            .load_inventory()
            .instrument(operation_span("inventory", None, None))
            .await?;
        self.cache.set_inventory(nodes.clone());
        Ok(nodes)
    }

    async fn load_inventory(&self) -> Result<Vec<Node>> {
        let args = args::inventory_show().json().into_vec();
        let doc = self.query(args, &FailureContext::inventory()).await?;
        let nodes = transform_inventory(&doc);
        debug!(count = nodes.len(), "loaded inventory");
        Ok(nodes)
    }

    /// Facts of one node
    pub async fn gather_facts(&self, node_id: &str) -> Result<Facts> {
        if let Some(facts) = self.cache.facts(node_id) {
            cache_event("facts", node_id, true);
            return Ok(facts);
        }
        cache_event("facts", node_id, false);

        let facts = self
            .load_facts(node_id)
            .instrument(operation_span("facts", Some(node_id), None))
            .await?;
        self.cache.set_facts(node_id, facts.clone());
        Ok(facts)
    }

    async fn load_facts(&self, node_id: &str) -> Result<Facts> {
        let args = args::gather_facts(node_id).json().into_vec();
        let command = self.command_line(&args);
        let doc = self.query(args, &FailureContext::facts(node_id)).await?;
        Ok(transform_facts(node_id, &doc, Utc::now(), Some(command)))
    }

    /// The task catalog, each task enriched with its parameter metadata.
    ///
    /// Costs one listing call plus one detail call per task; the result is
    /// kept until [`invalidate_tasks`](Self::invalidate_tasks).
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        if let Some(tasks) = self.cache.tasks() {
            cache_event("tasks", "all", true);
            return Ok(tasks);
        }
        cache_event("tasks", "all", false);

        let tasks = self
            .load_tasks()
            .instrument(operation_span("task-list", None, None))
            .await?;
        self.cache.set_tasks(tasks.clone());
        Ok(tasks)
    }

    async fn load_tasks(&self) -> Result<Vec<Task>> {
        let args = args::task_list().json().into_vec();
        let doc = self.query(args, &FailureContext::task_list()).await?;
        let listed = transform_task_list(&doc);

        let mut tasks = Vec::with_capacity(listed.len());
        for shallow in listed {
            match self.get_task_details(&shallow.name).await {
                Some(mut detailed) => {
                    if detailed.description.is_none() {
                        detailed.description = shallow.description;
                    }
                    tasks.push(detailed);
                }
                None => tasks.push(shallow),
            }
        }
        debug!(count = tasks.len(), "loaded task catalog");
        Ok(tasks)
    }

    /// The task catalog grouped by module
    pub async fn list_tasks_by_module(&self) -> Result<BTreeMap<String, Vec<Task>>> {
        let mut modules: BTreeMap<String, Vec<Task>> = BTreeMap::new();
        for task in self.list_tasks().await? {
            modules.entry(task.module.clone()).or_default().push(task);
        }
        Ok(modules)
    }

    /// Full metadata of one task, or `None` when bolt cannot describe it
    pub async fn get_task_details(&self, task_name: &str) -> Option<Task> {
        let args = args::task_show(task_name).json().into_vec();
        let context = FailureContext::task_details(task_name);
        let outcome = self
            .query(args, &context)
            .instrument(operation_span("task-details", None, Some(task_name)))
            .await;

        match outcome {
            Ok(doc) => transform_task_details(&doc),
            Err(e) => {
                debug!(task = task_name, code = e.code(), error = %e, "task details unavailable");
                None
            }
        }
    }

    /// Run a shell command on one node
    pub async fn run_command(
        &self,
        node_id: &str,
        command: &str,
        sink: Option<&dyn OutputSink>,
    ) -> Result<ExecutionResult> {
        if !self.config.command_whitelist.is_allowed(command) {
            warn!(node = node_id, command, "command rejected by allowlist");
            return Err(Error::command_not_allowed(command));
        }

        let plan = RunPlan {
            execution_type: ExecutionType::Command,
            node_id,
            action: command.to_string(),
            parameters: None,
            args: args::command_run(node_id, command),
            context: FailureContext::command(node_id),
            transform: command_results,
        };
        self.execute(plan, sink)
            .instrument(operation_span("command", Some(node_id), None))
            .await
    }

    /// Run a task on one node
    pub async fn run_task(
        &self,
        node_id: &str,
        task_name: &str,
        parameters: Option<Map<String, Value>>,
        sink: Option<&dyn OutputSink>,
    ) -> Result<ExecutionResult> {
        let plan = self.task_plan(ExecutionType::Task, node_id, task_name, parameters);
        self.execute(plan, sink)
            .instrument(operation_span("task", Some(node_id), Some(task_name)))
            .await
    }

    /// Trigger a puppet agent run on one node
    pub async fn run_puppet(
        &self,
        node_id: &str,
        options: &PuppetRunOptions,
        sink: Option<&dyn OutputSink>,
    ) -> Result<ExecutionResult> {
        let task = self.config.puppet_task.as_str();
        let params = options.to_params();
        let plan = self.task_plan(ExecutionType::Puppet, node_id, task, Some(params));
        self.execute(plan, sink)
            .instrument(operation_span("puppet", Some(node_id), Some(task)))
            .await
    }

    /// Install a package on one node
    pub async fn install_package(
        &self,
        node_id: &str,
        request: &PackageRequest,
        sink: Option<&dyn OutputSink>,
    ) -> Result<ExecutionResult> {
        let task = self.config.package_task.as_str();
        let params = request.to_params();
        let plan = self.task_plan(ExecutionType::Package, node_id, task, Some(params));
        self.execute(plan, sink)
            .instrument(operation_span("package", Some(node_id), Some(task)))
            .await
    }

    fn task_plan<'a>(
        &self,
        execution_type: ExecutionType,
        node_id: &'a str,
        task_name: &str,
        parameters: Option<Map<String, Value>>,
    ) -> RunPlan<'a> {
        RunPlan {
            execution_type,
            node_id,
            action: task_name.to_string(),
            args: args::task_run(node_id, task_name, parameters.as_ref()),
            parameters,
            context: FailureContext::task(node_id, task_name),
            transform: task_results,
        }
    }

    async fn execute(
        &self,
        plan: RunPlan<'_>,
        sink: Option<&dyn OutputSink>,
    ) -> Result<ExecutionResult> {
        let args = plan.args.json().into_vec();
        let mut result = ExecutionResult::running(
            Uuid::new_v4().to_string(),
            plan.execution_type,
            vec![plan.node_id.to_string()],
            plan.action,
            Utc::now(),
        );
        result.parameters = plan.parameters;
        result.command = Some(self.command_line(&args));

        let clock = Instant::now();
        let outcome = self
            .runner
            .execute(&args, &ExecOptions::default(), sink)
            .await;
        let duration_ms = clock.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(raw) if raw.success => {
                let doc = parse_output(&raw.stdout)?;
                let results = (plan.transform)(&doc, plan.node_id, duration_ms);
                result.stdout = non_empty(&raw.stdout);
                result.stderr = non_empty(&raw.stderr);
                result.complete(results, Utc::now())
            }
            Ok(raw) => {
                result.stdout = non_empty(&raw.stdout);
                result.stderr = non_empty(&raw.stderr);
                let error = self.classified(raw.into_error(), &plan.context);
                if !error.is_generic_execution() {
                    return Err(error);
                }
                degrade(result, &error, plan.transform, plan.node_id, duration_ms)
            }
            Err(error) => {
                let error = self.classified(error, &plan.context);
                if !error.is_generic_execution() {
                    return Err(error);
                }
                degrade(result, &error, plan.transform, plan.node_id, duration_ms)
            }
        };

        execution_completed(&result.id, result.status.as_str(), duration_ms);
        Ok(result)
    }

    pub fn invalidate_inventory(&self) {
        self.cache.invalidate_inventory();
    }

    /// Drop cached facts of one node, or of all nodes
    pub fn invalidate_facts(&self, node_id: Option<&str>) {
        self.cache.invalidate_facts(node_id);
    }

    pub fn invalidate_tasks(&self) {
        self.cache.invalidate_tasks();
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> ExecutionCacheStats {
        self.cache.stats()
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// A failed result for a run that failed in a way nobody classified.
///
/// Per-node results come from bolt's JSON on stdout when it reported at
/// least one failed target, otherwise a single failed result carries the
/// error message.
fn degrade(
    result: ExecutionResult,
    error: &Error,
    transform: ResultTransform,
    node_id: &str,
    duration_ms: u64,
) -> ExecutionResult {
    let message = error.to_string();
    let recovered = error
        .failure_output()
        .and_then(|output| parse_output(&output.stdout).ok())
        .map(|doc| transform(&doc, node_id, duration_ms))
        .filter(|results| results.iter().any(|r| r.status == NodeStatus::Failed));

    let results = match recovered {
        Some(results) => results,
        None => vec![NodeResult::failed(node_id, message.clone(), duration_ms)],
    };
    debug!(
        node = node_id,
        results = results.len(),
        "returning degraded result"
    );

    let mut result = result.complete(results, Utc::now());
    result.error = Some(message);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use boltdesk_core::ExecutionStatus;
    use serde_json::json;

    fn service(runner: &ScriptedRunner) -> BoltService {
        BoltService::with_runner(BoltConfig::default(), Arc::new(runner.clone()))
    }

    #[test]
    fn test_puppet_params() {
        let options = PuppetRunOptions {
            noop: true,
            tags: vec!["ntp".into(), "ssh".into()],
            environment: Some("staging".into()),
            ..Default::default()
        };
        assert_eq!(
            Value::Object(options.to_params()),
            json!({"noop": true, "tags": "ntp,ssh", "environment": "staging"})
        );
        assert!(PuppetRunOptions::default().to_params().is_empty());
    }

    #[test]
    fn test_package_params() {
        assert_eq!(
            Value::Object(PackageRequest::new("nginx").to_params()),
            json!({"action": "install", "name": "nginx"})
        );
        let pinned = PackageRequest::new("nginx").with_version("1.24.0");
        assert_eq!(
            Value::Object(pinned.to_params()),
            json!({"action": "install", "name": "nginx", "version": "1.24.0"})
        );
    }

    #[tokio::test]
    async fn test_spawn_failure_degrades() {
        let runner = ScriptedRunner::new();
        runner.respond_spawn_failure(
            &args::command_run("web-01", "uptime").json().into_vec(),
            "failed to execute 'bolt': No such file or directory",
        );

        let result = service(&runner)
            .run_command("web-01", "uptime", None)
            .await
            .unwrap();
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].node_id, "web-01");
        assert!(result.error.unwrap().contains("No such file"));
    }

    #[tokio::test]
    async fn test_success_with_garbage_is_a_parse_error() {
        let runner = ScriptedRunner::new();
        runner.respond(
            &args::command_run("web-01", "uptime").json().into_vec(),
            "Started on web-01...",
            "",
            0,
        );

        let err = service(&runner)
            .run_command("web-01", "uptime", None)
            .await
            .unwrap_err();
        match err {
            Error::Parse { output, .. } => assert_eq!(output, "Started on web-01..."),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
