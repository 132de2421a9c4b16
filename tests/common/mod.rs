//! Scripted stand-in for the host system, shared by the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use archtidy::common::errors::MaintenanceError;
use archtidy::system::{CommandOutput, System};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub privileged: bool,
    pub argv: Vec<String>,
}

impl Recorded {
    pub fn line(&self) -> String {
        self.argv.join(" ")
    }
}

#[derive(Default)]
pub struct FakeSystem {
    sets: RefCell<HashMap<String, VecDeque<Result<Vec<String>, String>>>>,
    outputs: HashMap<String, CommandOutput>,
    failing: Vec<String>,
    sizes: RefCell<HashMap<PathBuf, VecDeque<u64>>>,
    dirs: HashMap<PathBuf, Vec<PathBuf>>,
    available: HashSet<String>,
    confirm: Option<Result<bool, String>>,
    reboot_error: Option<String>,
    pub commands: RefCell<Vec<Recorded>>,
    pub confirm_calls: Cell<usize>,
    pub reboots: Cell<usize>,
}

impl FakeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue successive answers for a selector; the last one repeats
    pub fn with_set(mut self, selector: &str, elements: &[&str]) -> Self {
        self.sets
            .get_mut()
            .entry(selector.to_string())
            .or_default()
            .push_back(Ok(elements.iter().map(|s| s.to_string()).collect()));
        self
    }

    pub fn with_failing_set(mut self, selector: &str, message: &str) -> Self {
        self.sets
            .get_mut()
            .entry(selector.to_string())
            .or_default()
            .push_back(Err(message.to_string()));
        self
    }

    /// Output returned by `run_command` for this exact command line
    pub fn with_output(mut self, line: &str, output: CommandOutput) -> Self {
        self.outputs.insert(line.to_string(), output);
        self
    }

    /// Mutating commands whose line starts with `prefix` exit 1
    pub fn failing(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    /// Successive directory size readings; the last one repeats
    pub fn with_sizes(mut self, path: &str, readings: &[u64]) -> Self {
        self.sizes
            .get_mut()
            .insert(PathBuf::from(path), readings.iter().copied().collect());
        self
    }

    pub fn with_dir(mut self, path: &str, children: &[&str]) -> Self {
        self.dirs.insert(
            PathBuf::from(path),
            children.iter().map(|c| Path::new(path).join(c)).collect(),
        );
        self
    }

    pub fn with_programs(mut self, programs: &[&str]) -> Self {
        self.available.extend(programs.iter().map(|p| p.to_string()));
        self
    }

    pub fn confirming(mut self, answer: bool) -> Self {
        self.confirm = Some(Ok(answer));
        self
    }

    pub fn without_dialog(mut self, message: &str) -> Self {
        self.confirm = Some(Err(message.to_string()));
        self
    }

    pub fn reboot_fails(mut self, message: &str) -> Self {
        self.reboot_error = Some(message.to_string());
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.commands.borrow().iter().map(Recorded::line).collect()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.lines().iter().any(|l| l.starts_with(prefix))
    }

    fn record(&self, privileged: bool, argv: &[String]) -> CommandOutput {
        let recorded = Recorded {
            privileged,
            argv: argv.to_vec(),
        };
        let line = recorded.line();
        self.commands.borrow_mut().push(recorded);
        if self.failing.iter().any(|p| line.starts_with(p.as_str())) {
            CommandOutput::failed(1, "boom")
        } else {
            CommandOutput::ok("")
        }
    }
}

impl System for FakeSystem {
    fn query_named_set(&self, selector: &str) -> Result<Vec<String>, MaintenanceError> {
        let mut sets = self.sets.borrow_mut();
        let queue = sets
            .get_mut(selector)
            .ok_or_else(|| MaintenanceError::query(selector, "not scripted"))?;
        let answer = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match answer {
            Some(Ok(elements)) => Ok(elements),
            Some(Err(message)) => Err(MaintenanceError::query(selector, message)),
            None => Err(MaintenanceError::query(selector, "not scripted")),
        }
    }

    fn run_command(&self, argv: &[String]) -> anyhow::Result<CommandOutput> {
        let line = argv.join(" ");
        Ok(self
            .outputs
            .get(&line)
            .cloned()
            .unwrap_or_else(|| CommandOutput::ok("")))
    }

    fn run_action(&self, argv: &[String]) -> anyhow::Result<CommandOutput> {
        Ok(self.record(false, argv))
    }

    fn run_privileged_command(&self, argv: &[String]) -> anyhow::Result<CommandOutput> {
        Ok(self.record(true, argv))
    }

    fn measure_directory_size(&self, path: &Path) -> u64 {
        let mut sizes = self.sizes.borrow_mut();
        match sizes.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(0),
            Some(queue) => queue.front().copied().unwrap_or(0),
            None => 0,
        }
    }

    fn list_directory(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        match self.dirs.get(path) {
            Some(children) => Ok(children.clone()),
            None => anyhow::bail!("No such directory: {}", path.display()),
        }
    }

    fn is_available(&self, program: &str) -> bool {
        self.available.contains(program)
    }

    fn confirmation_dialog(&self, _title: &str, _message: &str) -> Result<bool, MaintenanceError> {
        self.confirm_calls.set(self.confirm_calls.get() + 1);
        match &self.confirm {
            Some(Ok(answer)) => Ok(*answer),
            Some(Err(message)) => Err(MaintenanceError::unavailable(message.clone())),
            None => Ok(false),
        }
    }

    fn trigger_reboot(&self) -> anyhow::Result<()> {
        self.reboots.set(self.reboots.get() + 1);
        match &self.reboot_error {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(()),
        }
    }
}
