//! End-to-end orchestration: login, discovery, confirmation, task loop.

use crate::auth::session::SessionManager;
use crate::cli::prompt::Prompter;
use crate::course::reference::parse_course_reference;
use crate::course::workitems::{self, generate_work_items};
use crate::error::PilotError;
use crate::http::HttpClient;
use crate::runner::{self, Pacing, ScoClient};
use anyhow::{ensure, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Everything the run needs; unset fields are prompted for.
pub struct RunArgs {
    pub cookie: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub course_url: Option<String>,
    pub uid: Option<String>,
    pub units: Vec<u32>,
    pub max_section: u32,
    pub min_delay: f64,
    pub max_delay: f64,
    pub yes: bool,
}

pub async fn run(args: RunArgs) -> Result<()> {
    ensure!(
        args.min_delay >= 0.0 && args.max_delay >= args.min_delay,
        "delay range must satisfy 0 <= min <= max"
    );

    let mut prompter = Prompter::new()?;
    let mut session = SessionManager::new(HttpClient::new(15_000));

    login(&mut session, &args, &mut prompter).await?;

    let course_url = match &args.course_url {
        Some(url) => url.clone(),
        None => {
            println!("course study page URL, e.g.");
            println!("  http://welearn.sflep.com/Student/StudyCourse.aspx?cid=1234&classid=123456");
            prompter.required("URL > ")?
        }
    };
    let (course_id, class_id) = parse_course_reference(&course_url)?;
    session.set_course(course_id, class_id);

    resolve_account_id(&mut session, &args, &mut prompter).await?;

    let account_id = session
        .account_id()
        .context("account id missing after discovery")?
        .to_string();
    let course_id = session
        .course_id()
        .context("course id missing")?
        .to_string();
    let class_id = session.class_id().context("class id missing")?.to_string();

    println!("account id: {account_id}");
    println!("course id:  {course_id}");
    println!("class id:   {class_id}");

    if !args.yes && !prompter.confirm("run the full queue? (y/n) > ")? {
        println!("aborted");
        return Ok(());
    }

    let units = if args.units.is_empty() {
        workitems::default_units()
    } else {
        args.units.clone()
    };
    let items = generate_work_items(&units, args.max_section);
    println!("queue generated: {} items (ctrl-c stops after the current item)", items.len());

    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\ninterrupt received, finishing the current item");
            flag.store(true, Ordering::Relaxed);
        }
    });

    let pacing = Pacing {
        min: Duration::from_secs_f64(args.min_delay),
        max: Duration::from_secs_f64(args.max_delay),
    };
    let sco = ScoClient::new(session.http(), course_id, class_id, account_id);

    let tally = runner::run_all(&sco, &items, pacing, &stop, |scoid, outcome| {
        println!("  {scoid} -> {outcome}");
    })
    .await;

    println!();
    if tally.interrupted {
        println!("stopped by interrupt after {} items", tally.processed());
    } else {
        println!("finished: {} items processed", tally.processed());
    }
    println!(
        "  completed {}, already done {}, skipped {}, no data {}, submit failed {}",
        tally.completed,
        tally.already_done,
        tally.not_activatable,
        tally.fetch_failed,
        tally.submit_failed
    );
    println!("refresh the course page to see the updated progress");

    Ok(())
}

async fn login(
    session: &mut SessionManager,
    args: &RunArgs,
    prompter: &mut Prompter,
) -> Result<()> {
    if let Some(cookie) = &args.cookie {
        session.adopt(cookie);
        return Ok(());
    }
    if let (Some(user), Some(password)) = (&args.user, &args.password) {
        session
            .establish(user, password)
            .await
            .context("login failed")?;
        println!("login succeeded");
        return Ok(());
    }

    println!("login:");
    println!("  1. account and password");
    println!("  2. paste a captured cookie");
    let choice = prompter.line("choose (1/2) > ")?;
    if choice == "2" {
        let cookie = prompter.required("cookie > ")?;
        session.adopt(&cookie);
    } else {
        let user = match &args.user {
            Some(user) => user.clone(),
            None => prompter.required("account > ")?,
        };
        let password = match &args.password {
            Some(password) => password.clone(),
            None => prompter.required("password > ")?,
        };
        session
            .establish(&user, &password)
            .await
            .context("login failed")?;
        println!("login succeeded");
    }
    Ok(())
}

async fn resolve_account_id(
    session: &mut SessionManager,
    args: &RunArgs,
    prompter: &mut Prompter,
) -> Result<()> {
    if let Some(uid) = &args.uid {
        session.set_account_id(uid.clone());
        return Ok(());
    }

    match session.probe_account_id().await {
        Ok(uid) => {
            println!("account id {uid} discovered automatically");
            Ok(())
        }
        Err(PilotError::IdentifierNotFound) => {
            println!("could not locate the account id automatically");
            let uid = prompter.required("account id > ")?;
            session.set_account_id(uid);
            Ok(())
        }
        Err(e) => Err(e).context("account discovery failed"),
    }
}
