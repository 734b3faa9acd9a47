use serde::Deserialize;
use redis::{Commands, Connection};
use strum_macros::{Display};
use std::thread;
use std::time::Duration;
use tracing::warn;

static POLL_INTERVAL_MS: u64 = 100;

#[derive(Display, Debug)]
pub enum Status {
    Loading,
    Ready,
    Running,
}

#[derive(PartialEq, Debug, Deserialize)]
enum Message {
    Start,                          //
    Extend(usize),                  // rounds
    Export,                         //
    Reset,                          //
}

#[derive(PartialEq, Debug)]
pub enum Command {
    Start,
    Extend(usize),
    Export,
    Reset
}

impl From<Message> for Command {
    fn from(msg: Message) -> Command {
        match msg {
            Message::Start => Command::Start,
            Message::Extend(n) => Command::Extend(n),
            Message::Export => Command::Export,
            Message::Reset => Command::Reset,
        }
    }
}

fn parse_command(raw: &str) -> Option<Command> {
    match serde_json::from_str::<Message>(raw) {
        Ok(msg) => Some(msg.into()),
        Err(err) => {
            warn!(raw = raw, error = %err, "ignoring malformed command");
            None
        }
    }
}

pub struct Commander {
    con: Connection,
}

impl Commander {
    pub fn new(redis_host: &str) -> redis::RedisResult<Commander> {
        let client = redis::Client::open(redis_host)?;
        let con = client.get_connection()?;

        Ok(Commander {
            con: con,
        })
    }

    fn set_status(&mut self, state: Status) -> redis::RedisResult<()> {
        let _: () = self.con.set("status", state.to_string().to_lowercase())?;
        Ok(())
    }

    pub fn set_ready(&mut self) -> redis::RedisResult<()> {
        self.set_status(Status::Ready)
    }

    pub fn set_running(&mut self) -> redis::RedisResult<()> {
        self.set_status(Status::Running)
    }

    pub fn set_loading(&mut self) -> redis::RedisResult<()> {
        self.set_status(Status::Loading)
    }

    pub fn reset(&mut self) -> redis::RedisResult<()> {
        let _: () = self.con.del("cmds")?;
        self.clear_state()
    }

    // Drop published run state,
    // leaving queued commands alone
    pub fn clear_state(&mut self) -> redis::RedisResult<()> {
        let _: () = self.con.del("state:history")?;
        let _: () = self.con.del("state:csv")?;
        self.con.set("state:step", -1)
    }

    pub fn publish_csv(&mut self, csv: &str) -> redis::RedisResult<()> {
        self.con.set("state:csv", csv)
    }

    pub fn wait_for_command(&mut self) -> redis::RedisResult<Command> {
        loop {
            if let Some(ctrl) = self.process_commands()? {
                return Ok(ctrl);
            }
            thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
        }
    }

    // Drain the queue, keeping the latest valid command
    pub fn process_commands(&mut self) -> redis::RedisResult<Option<Command>> {
        let mut command = None;
        loop {
            let cmd_raw: Option<String> = self.con.lpop("cmds")?;
            match cmd_raw {
                None => break,
                Some(cmd) => {
                    if let Some(cmd) = parse_command(&cmd) {
                        command = Some(cmd);
                    }
                }
            }
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("\"Start\""), Some(Command::Start));
        assert_eq!(parse_command("{\"Extend\": 10}"), Some(Command::Extend(10)));
        assert_eq!(parse_command("\"Export\""), Some(Command::Export));
        assert_eq!(parse_command("\"Reset\""), Some(Command::Reset));
        assert_eq!(parse_command("{\"Extend\": -1}"), None);
        assert_eq!(parse_command("nonsense"), None);
    }
}
