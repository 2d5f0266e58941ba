use crate::commands::task::{parse_params, TaskCommands};
use crate::commands::Commands;
use crate::output::{print_execution, print_json, StderrSink};
use boltdesk_bolt::{BoltService, OutputSink, PackageRequest, PuppetRunOptions};
use std::process::ExitCode;

impl Commands {
    pub async fn execute(self, service: &BoltService, stream: bool) -> eyre::Result<ExitCode> {
        let sink = stream.then_some(&StderrSink as &dyn OutputSink);

        match self {
            Commands::Inventory => {
                print_json(&service.list_inventory().await?)?;
                Ok(ExitCode::SUCCESS)
            }
            Commands::Facts { node } => {
                print_json(&service.gather_facts(&node).await?)?;
                Ok(ExitCode::SUCCESS)
            }
            Commands::Run { node, command } => {
                let command = command.join(" ");
                print_execution(&service.run_command(&node, &command, sink).await?)
            }
            Commands::Task { command } => command.execute(service, sink).await,
            Commands::Puppet {
                node,
                noop,
                no_noop,
                tags,
                environment,
                debug,
            } => {
                let options = PuppetRunOptions {
                    noop,
                    no_noop,
                    tags,
                    environment,
                    debug,
                };
                print_execution(&service.run_puppet(&node, &options, sink).await?)
            }
            Commands::Package {
                node,
                name,
                version,
            } => {
                let request = PackageRequest { name, version };
                print_execution(&service.install_package(&node, &request, sink).await?)
            }
        }
    }
}

impl TaskCommands {
    pub async fn execute(
        self,
        service: &BoltService,
        sink: Option<&dyn OutputSink>,
    ) -> eyre::Result<ExitCode> {
        match self {
            TaskCommands::List { by_module: false } => {
                print_json(&service.list_tasks().await?)?;
                Ok(ExitCode::SUCCESS)
            }
            TaskCommands::List { by_module: true } => {
                print_json(&service.list_tasks_by_module().await?)?;
                Ok(ExitCode::SUCCESS)
            }
            TaskCommands::Show { name } => match service.get_task_details(&name).await {
                Some(task) => {
                    print_json(&task)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => Err(eyre::eyre!("bolt could not describe task '{name}'")),
            },
            TaskCommands::Run { node, task, params } => {
                let params = parse_params(params.as_deref())?;
                print_execution(&service.run_task(&node, &task, params, sink).await?)
            }
        }
    }
}
