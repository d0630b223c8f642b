use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use blocking_future::worker::{CancelFlag, SignallableWorker, TaskWorker};
use blocking_future::{BlockingFuture, Outcome, PendingResult};
use futures::StreamExt;
use futures::future::FusedFuture;
use tokio::select;
use tokio::time::{error::Elapsed, Duration, Instant, sleep, timeout};

fn pending <V> (ceiling: Duration) -> PendingResult <V>
where V: Clone + Send + 'static
{
	PendingResult::new (ceiling) . unwrap ()
}

#[tokio::main]
#[test]
async fn task_worker_completes () -> Result <(), Elapsed>
{
	let pending = pending (Duration::from_secs (1));
	let producer = pending . clone ();
	let worker = TaskWorker::spawn
	(
		async move
		{
			sleep (Duration::from_millis (100)) . await;
			producer . set_final (Outcome::one (42_u32));
		}
	);
	let future = BlockingFuture::new (worker, pending);

	let outcome = timeout (Duration::from_millis (500), future . completion ()) . await?;
	assert_eq! (outcome, Outcome::one (42));

	Ok (())
}

#[tokio::main]
#[test]
async fn task_worker_is_aborted_on_cancel () -> Result <(), Elapsed>
{
	let pending = pending (Duration::from_secs (10));
	let producer = pending . clone ();
	let worker = TaskWorker::spawn
	(
		async move
		{
			sleep (Duration::from_secs (10)) . await;
			producer . set_final (Outcome::one (42_u32));
		}
	);
	let future = BlockingFuture::new (worker . clone (), pending);

	assert! (future . cancel ("stop") . is_cancelled ());

	timeout
	(
		Duration::from_millis (500),
		async
		{
			while ! worker . is_finished ()
			{
				sleep (Duration::from_millis (10)) . await;
			}
		}
	) . await?;

	assert! (future . wait (Duration::ZERO) . is_cancelled ());

	Ok (())
}

#[tokio::main]
#[test]
async fn panicking_task_completes_with_an_error () -> Result <(), Elapsed>
{
	let pending = pending::<u32> (Duration::from_secs (1));
	let worker = TaskWorker::spawn (async { panic! ("task exploded") });
	let future = BlockingFuture::new (worker, pending);

	match timeout (Duration::from_millis (500), future . completion ()) . await?
	{
		Outcome::Error (failure) => assert_eq! (failure . message (), "worker panicked: task exploded"),
		other => panic! ("expected an error, got {:?}", other)
	}

	Ok (())
}

#[tokio::main]
#[test]
async fn signallable_worker_is_asked_to_stop () -> Result <(), Elapsed>
{
	let pending = pending::<u32> (Duration::from_secs (10));
	let stopped = Arc::new (AtomicBool::new (false));
	let observer = stopped . clone ();

	let worker = SignallableWorker::spawn
	(
		move |shutdown| async move
		{
			select!
			{
				_ = shutdown => observer . store (true, Ordering::SeqCst),
				_ = sleep (Duration::from_secs (10)) => {}
			}
		}
	);
	let future = BlockingFuture::new (worker, pending);

	sleep (Duration::from_millis (50)) . await;
	assert! (future . cancel ("stop") . is_cancelled ());

	timeout
	(
		Duration::from_millis (500),
		async
		{
			while ! stopped . load (Ordering::SeqCst)
			{
				sleep (Duration::from_millis (10)) . await;
			}
		}
	) . await
}

#[tokio::main]
#[test]
async fn wait_async_writes_the_timeout ()
{
	let pending = pending::<u32> (Duration::from_secs (10));
	let future = BlockingFuture::new (CancelFlag::new (), pending);
	let started = Instant::now ();

	let outcome = future . wait_async (Duration::from_millis (100)) . await;

	assert! (outcome . is_timeout ());
	assert! (started . elapsed () >= Duration::from_millis (100));
	assert! (future . is_complete ());
	assert_eq! (future . wait (Duration::from_secs (1)), outcome);
	assert_eq! (future . pending () . waiter_count (), 0);
}

#[tokio::main]
#[test]
async fn wait_async_is_bounded_by_the_ceiling () -> Result <(), Elapsed>
{
	let pending = pending::<u32> (Duration::from_millis (100));
	let future = BlockingFuture::new (CancelFlag::new (), pending);

	let outcome = timeout (Duration::from_secs (1), future . wait_async (Duration::from_secs (10))) . await?;
	assert! (outcome . is_timeout ());

	Ok (())
}

#[tokio::main]
#[test]
async fn completion_is_fused_and_withdraws_when_dropped ()
{
	let pending = pending (Duration::from_secs (1));
	let future = BlockingFuture::new (CancelFlag::new (), pending . clone ());

	let abandoned = future . completion ();
	assert_eq! (pending . waiter_count (), 1);
	drop (abandoned);
	assert_eq! (pending . waiter_count (), 0);

	let mut completion = future . completion ();
	assert! (! completion . is_terminated ());

	pending . set_final (Outcome::one ("done"));

	assert_eq! ((&mut completion) . await, Outcome::one ("done"));
	assert! (completion . is_terminated ());
}

#[tokio::main]
#[test]
async fn progress_streams_partials_then_the_final_value () -> Result <(), Elapsed>
{
	let pending = pending (Duration::from_secs (5));
	let producer = pending . clone ();
	let worker = TaskWorker::spawn
	(
		async move
		{
			for partial in 1 ..= 3_u32
			{
				sleep (Duration::from_millis (50)) . await;
				producer . set_partial (Outcome::one (partial));
			}

			sleep (Duration::from_millis (50)) . await;
			producer . set_final (Outcome::many ([1_u32, 2, 3, 4]));
		}
	);
	let future = BlockingFuture::new (worker, pending);

	let seen: Vec <Outcome <u32>> = timeout (Duration::from_secs (2), future . progress () . collect ()) . await?;

	assert_eq! (seen . last (), Some (&Outcome::many ([1, 2, 3, 4])));

	let partials: Vec <u32> = seen [.. seen . len () - 1] . iter ()
		. filter_map (|outcome| outcome . first () . copied ())
		. collect ();
	assert! (partials . windows (2) . all (|pair| pair [0] < pair [1]));

	Ok (())
}

#[tokio::main]
#[test]
async fn progress_of_a_completed_future_yields_only_the_final_value () -> Result <(), Elapsed>
{
	let pending = pending (Duration::from_secs (1));
	let future = BlockingFuture::new (CancelFlag::new (), pending . clone ());

	pending . set_final (Outcome::one ('x'));

	let seen: Vec <Outcome <char>> = timeout (Duration::from_millis (500), future . progress () . collect ()) . await?;
	assert_eq! (seen, vec! [Outcome::one ('x')]);

	Ok (())
}
