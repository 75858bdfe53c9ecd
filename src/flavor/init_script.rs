use std::path::Path;

use crate::config::ScriptSettings;
use crate::flavor::ASSOCIATION_TAG;

/// How the new node joins, chosen per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinPlan {
    Worker {
        token: String,
        manager_addr: String,
    },
    Manager {
        token: String,
        peers: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct InitContext<'a> {
    pub association_id: &'a str,
    pub cluster_id: &'a str,
    pub join: &'a JoinPlan,
}

/// Boot script: label the engine with the association id, reload it, join the swarm.
pub fn render(ctx: &InitContext<'_>, settings: &ScriptSettings) -> String {
    let daemon_dir = Path::new(&settings.daemon_config)
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/etc/docker".to_string());

    let cluster_line = if ctx.cluster_id.is_empty() {
        String::new()
    } else {
        format!("# swarm cluster {}\n", ctx.cluster_id)
    };

    let join = match ctx.join {
        JoinPlan::Worker {
            token,
            manager_addr,
        } => format!(
            "docker swarm join --token {} {}\n",
            quote(token),
            quote(manager_addr)
        ),
        JoinPlan::Manager { token, peers } => {
            let targets: Vec<String> = peers
                .iter()
                .map(|p| quote(&format!("{}:{}", p, settings.swarm_port)))
                .collect();
            format!(
                r#"joined=no
for addr in {targets}; do
  if docker swarm join --token {token} "$addr"; then
    joined=yes
    break
  fi
done
if [ "$joined" != yes ]; then
  echo "no swarm manager accepted the join" >&2
  exit 1
fi
"#,
                targets = targets.join(" "),
                token = quote(token),
            )
        }
    };

    format!(
        r#"#!/bin/sh
set -o errexit
set -o nounset
set -o xtrace

{cluster_line}mkdir -p {daemon_dir}
cat << EOF > {daemon_config}
{{
  "labels": ["{tag}={association_id}"]
}}
EOF

# pick up the new engine labels
kill -s HUP $(cat {pid_file})
sleep 5

{join}"#,
        cluster_line = cluster_line,
        daemon_dir = quote(&daemon_dir),
        daemon_config = quote(&settings.daemon_config),
        tag = ASSOCIATION_TAG,
        association_id = ctx.association_id,
        pid_file = quote(&settings.docker_pid_file),
        join = join,
    )
}

/// Single-quote for POSIX sh.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
