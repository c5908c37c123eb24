//! External-process backend driving the `nargo` toolchain.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::circuit::CircuitHandle;
use crate::prover::{ProofBackend, ProofBytes, ProofError, Prover, ProverProcessError};
use crate::witness::WitnessInput;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Proves by writing `Prover.toml` and running `nargo prove` in the circuit
/// directory.
///
/// The child runs with the circuit directory as its working directory and is
/// waited on synchronously. With a timeout set, the child is killed once it
/// runs past the deadline.
#[derive(Debug, Clone)]
pub struct NargoProver {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl Default for NargoProver {
    fn default() -> Self {
        Self::new()
    }
}

impl NargoProver {
    pub fn new() -> Self {
        Self::with_command("nargo", ["prove"])
    }

    /// Use a different toolchain command line, e.g. a pinned nargo binary.
    pub fn with_command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn write_input(&self, circuit: &CircuitHandle, witness: &WitnessInput) -> Result<(), ProofError> {
        let path = circuit.prover_input_path();
        let document = witness.to_toml()?;
        debug!("Writing {} ({} bytes)", path.display(), document.len());
        fs::write(&path, document)
            .map_err(|source| ProverProcessError::WriteInput { path, source })?;
        Ok(())
    }

    /// Run the toolchain and wait for it, honouring the timeout.
    fn run(&self, dir: &Path) -> Result<(), ProverProcessError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProverProcessError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain both pipes so a chatty prover never blocks on a full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // On timeout the drain threads are left detached; a grandchild may
        // still hold the pipes open.
        let Some(status) = self.wait(&mut child)? else {
            return Err(ProverProcessError::TimedOut {
                program: self.program.clone(),
                after: self.timeout.unwrap_or_default(),
            });
        };
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !stdout.trim().is_empty() {
            debug!("{} output: {}", self.program, stdout.trim());
        }

        if status.success() {
            return Ok(());
        }
        error!("{} failed: {}", self.program, stderr.trim());
        Err(ProverProcessError::Exit {
            program: self.program.clone(),
            status: status.to_string(),
            stderr: stderr.trim().to_string(),
        })
    }

    /// `None` means the child was killed at the deadline.
    fn wait(&self, child: &mut Child) -> io::Result<Option<ExitStatus>> {
        let Some(timeout) = self.timeout else {
            return child.wait().map(Some);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                // The child may exit between try_wait and kill.
                let _ = child.kill();
                child.wait()?;
                return Ok(None);
            }
            thread::sleep(self.poll_interval);
        }
    }

    fn read_proof(&self, circuit: &CircuitHandle) -> Result<ProofBytes, ProverProcessError> {
        let path = circuit.proof_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProverProcessError::MissingOutput(path));
            }
            Err(e) => return Err(e.into()),
        };

        let proof = ProofBytes::from_hex(&text).map_err(|e| ProverProcessError::MalformedOutput {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if proof.is_empty() {
            return Err(ProverProcessError::MalformedOutput {
                path,
                reason: "empty proof".to_string(),
            });
        }
        Ok(proof)
    }
}

impl Prover for NargoProver {
    fn backend(&self) -> ProofBackend {
        ProofBackend::Nargo
    }

    fn prove(
        &self,
        circuit: &CircuitHandle,
        witness: &WitnessInput,
    ) -> Result<ProofBytes, ProofError> {
        self.write_input(circuit, witness)?;

        // A proof left over from an earlier run must not pass for this one.
        let proof_path = circuit.proof_path();
        match fs::remove_file(&proof_path) {
            Ok(()) => debug!("Removed stale proof {}", proof_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ProverProcessError::Io(e).into()),
        }

        info!(
            "Proving {} circuit in {} ({} {})",
            circuit.kind(),
            circuit.dir().display(),
            self.program,
            self.args.join(" ")
        );
        let started = Instant::now();
        self.run(circuit.dir())?;
        let proof = self.read_proof(circuit)?;

        info!(
            "New {} proof written ({} bytes, {}ms)",
            circuit.kind(),
            proof.len(),
            started.elapsed().as_millis()
        );
        Ok(proof)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut out = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut out);
        }
        out
    })
}
