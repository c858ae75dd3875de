use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::process::Stdio;

use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use toolrun_core::api::{parse_event_line, Args, Context, Event, EventStream, OperationError};
use toolrun_core::Operation;

const STDOUT_TAIL_LINES: usize = 50;
const STDERR_TAIL_BYTES: usize = 4096;

/// Runs a child process per attempt and streams its stdout.
///
/// Arguments are written to the child's stdin as one JSON object. Stdout
/// lines that parse as events are forwarded as those events; everything
/// else becomes `tool.stdout`. Dropping the stream kills the child.
pub struct CommandOperation {
    name: String,
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl CommandOperation {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn envs(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

fn tail_string(bytes: &[u8]) -> String {
    let start = bytes.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&bytes[start..]).trim().to_string()
}

impl Operation for CommandOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_stream<'a>(&'a self, args: Args, _ctx: &'a Context) -> EventStream<'a> {
        Box::pin(async_stream::stream! {
            let mut child = match self.command().spawn() {
                Ok(c) => c,
                Err(e) => {
                    yield Err(OperationError::io(format!("spawning {}", self.program), e));
                    return;
                }
            };
            let pid = child.id();
            tracing::debug!(target: "toolrun.plugins", program = %self.program, ?pid, "command spawned");
            let mut stage = Map::new();
            if let Some(pid) = pid {
                stage.insert("pid".to_string(), json!(pid));
            }
            yield Ok(Event::Progress { stage: "spawned".to_string(), detail: stage });

            let stderr_task = child.stderr.take().map(|mut stderr| {
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let _ = stderr.read_to_end(&mut buf).await;
                    buf
                })
            });

            // Fed from its own task so a child that writes before reading
            // cannot stall on a full stdout pipe.
            if let Some(mut stdin) = child.stdin.take() {
                let body = Value::Object(args).to_string();
                tokio::spawn(async move {
                    // Children that ignore stdin may close it early.
                    if let Err(e) = stdin.write_all(body.as_bytes()).await {
                        tracing::debug!(target: "toolrun.plugins", error = %e, "command stdin not accepted");
                    }
                });
            }

            let Some(stdout) = child.stdout.take() else {
                yield Err(OperationError::failed("child stdout was not captured"));
                return;
            };
            let mut lines = BufReader::new(stdout).lines();
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDOUT_TAIL_LINES);
            let mut line_count: u64 = 0;

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        line_count += 1;
                        match parse_event_line(&line) {
                            Ok(Some(Event::Start { .. })) | Ok(None) => {}
                            Ok(Some(event)) => {
                                let terminal = event.is_terminal();
                                yield Ok(event);
                                if terminal {
                                    return;
                                }
                            }
                            Err(_) => {
                                if tail.len() == STDOUT_TAIL_LINES {
                                    tail.pop_front();
                                }
                                tail.push_back(line.clone());
                                yield Ok(Event::stdout(line));
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(OperationError::io(format!("reading {} stdout", self.program), e));
                        return;
                    }
                }
            }

            let status = match child.wait().await {
                Ok(s) => s,
                Err(e) => {
                    yield Err(OperationError::io(format!("waiting for {}", self.program), e));
                    return;
                }
            };
            let stderr = match stderr_task {
                Some(task) => task.await.map(|b| tail_string(&b)).unwrap_or_default(),
                None => String::new(),
            };

            if status.success() {
                let mut output = Map::new();
                output.insert("exit_code".to_string(), json!(0));
                output.insert("stdout_lines".to_string(), json!(line_count));
                let mut observation = Map::new();
                observation.insert(
                    "summary".to_string(),
                    json!(format!("{} exited successfully", self.name)),
                );
                observation.insert(
                    "stdout".to_string(),
                    json!(tail.into_iter().collect::<Vec<_>>().join("\n")),
                );
                if !stderr.is_empty() {
                    observation.insert("stderr".to_string(), json!(stderr));
                }
                yield Ok(Event::end(Some(output), observation));
            } else {
                let code = status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                let mut message = format!("{} exited with status {}", self.program, code);
                if !stderr.is_empty() {
                    message.push_str(": ");
                    message.push_str(&stderr);
                }
                yield Ok(Event::error(message));
            }
        })
    }
}
