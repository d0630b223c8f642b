use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use blocking_future::future::Progressive;
use blocking_future::outcome::{FilterState, Unavailable};
use blocking_future::worker::{CancelFlag, ThreadWorker};
use blocking_future::{BlockingFuture, Outcome, PendingResult};

fn step () -> Duration
{
	Duration::from_millis (200)
}

// Posts partial values after one and two steps, and the final value after
// three, unless interrupted.
fn three_step_worker (producer: PendingResult <&'static str>) -> ThreadWorker
{
	ThreadWorker::named
	(
		"three-step",
		move |interrupt|
		{
			for partial in ["first", "second"]
			{
				if interrupt . sleep (step ()) . is_err ()
				{
					return;
				}

				producer . set_partial (Outcome::one (partial));
			}

			if interrupt . sleep (step ()) . is_ok ()
			{
				producer . set_final (Outcome::one ("final"));
			}
		}
	)
}

#[test]
fn partials_are_visible_before_the_final_value ()
{
	let pending = PendingResult::new (Duration::from_secs (10)) . unwrap ();
	let worker = three_step_worker (pending . clone ());
	let future = BlockingFuture::new (worker . clone (), pending);

	worker . start () . unwrap ();

	thread::sleep (step () + step () / 2);
	assert_eq! (future . peek_partial_or_none (), Outcome::one ("first"));
	assert_eq! (future . head (), Some ("first"));
	assert! (! future . has_value ());
	assert_eq! (future . count (), 0);

	assert_eq! (future . wait (Duration::from_secs (10)), Outcome::one ("final"));
	assert_eq! (future . or_none (), Some ("final"));
	assert_eq! (future . blocking_max (), Duration::ZERO);

	worker . join ();
	assert_eq! (worker . name (), Some ("three-step"));
}

#[test]
fn wait_times_out_at_the_requested_timeout ()
{
	let pending = PendingResult::<&'static str>::new (Duration::from_secs (10)) . unwrap ();
	let future = BlockingFuture::new (CancelFlag::new (), pending);
	let started = Instant::now ();

	let outcome = future . wait (Duration::from_millis (200));
	let waited = started . elapsed ();

	assert! (outcome . is_timeout ());
	assert! (waited >= Duration::from_millis (200));
	assert! (waited < Duration::from_secs (5));
	assert! (future . is_complete ());
	assert! (! future . is_cancelled ());
}

#[test]
fn cancel_keeps_the_last_partial_value ()
{
	let pending = PendingResult::new (Duration::from_secs (30)) . unwrap ();
	let worker = three_step_worker (pending . clone ());
	let future = BlockingFuture::new (worker . clone (), pending);

	worker . start () . unwrap ();
	thread::sleep (step () * 2 + step () / 2);

	let cancelled = future . cancel ("no longer needed");
	let outcome = future . wait (Duration::from_secs (20));

	assert! (outcome . is_cancelled ());
	assert_eq! (outcome, cancelled);
	assert_eq! (outcome . partial (), Some (&Outcome::one ("second")));
	assert! (future . is_cancelled ());

	let started = Instant::now ();
	worker . join ();
	assert! (started . elapsed () < Duration::from_secs (1));
}

#[test]
fn cancel_after_completion_returns_the_completed_value ()
{
	let pending = PendingResult::new (Duration::from_secs (1)) . unwrap ();
	let future = BlockingFuture::new (CancelFlag::new (), pending . clone ());

	pending . set_final (Outcome::one (7_u32));

	assert_eq! (future . cancel ("too late"), Outcome::one (7));
	assert_eq! (future . cancel ("again"), Outcome::one (7));
	assert_eq! (future . wait (Duration::from_secs (1)), Outcome::one (7));
}

#[test]
fn a_panicking_worker_completes_the_future_with_an_error ()
{
	let hooked = Arc::new (Mutex::new (None));
	let sink = hooked . clone ();

	let pending = PendingResult::<u32>::new (Duration::from_secs (5)) . unwrap ();
	let worker = ThreadWorker::new (|_| panic! ("disk on fire"))
		. with_panic_hook (move |failure| *sink . lock () . unwrap () = Some (failure . to_string ()));
	let future = BlockingFuture::new (worker . clone (), pending);

	worker . start () . unwrap ();

	match future . wait (Duration::from_secs (5))
	{
		Outcome::Error (failure) =>
		{
			assert_eq! (failure . message (), "worker panicked: disk on fire");
			assert! (failure . elapsed () . is_some ());
			assert! (failure . cause () . is_some ());
		}
		other => panic! ("expected an error, got {:?}", other)
	}

	worker . join ();
	assert_eq!
	(
		hooked . lock () . unwrap () . take () . as_deref (),
		Some ("worker panicked: disk on fire")
	);
}

#[test]
fn a_worker_starts_only_once ()
{
	let worker = ThreadWorker::new (|_| {});

	worker . start () . unwrap ();
	assert_eq! (worker . start () . unwrap_err () . kind (), io::ErrorKind::AlreadyExists);

	worker . join ();
}

#[test]
fn accessors_never_block_on_a_pending_future ()
{
	let pending = PendingResult::<u32>::new (Duration::from_secs (10)) . unwrap ();
	let future = BlockingFuture::new (CancelFlag::new (), pending)
		. with_unavailable (Unavailable::new ("still counting"));
	let started = Instant::now ();

	assert! (! future . has_value ());
	assert_eq! (future . count (), 0);
	assert_eq! (future . iter () . count (), 0);
	assert_eq! (future . or_default (5), 5);
	assert_eq! (future . or_none (), None);
	assert_eq! (future . or_fail () . unwrap_err () . message (), "still counting");
	assert_eq! (future . head (), None);
	assert_eq! (future . filter (), FilterState::Discarded);
	assert_eq! (future . completed (), None);
	assert_eq! (future . blocking_max (), Duration::from_secs (10));
	assert_eq! (future . peek_partial_or_none (), Outcome::Empty (Unavailable::new ("still counting")));

	assert! (started . elapsed () < Duration::from_millis (100));
}

#[test]
fn accessors_read_the_final_value ()
{
	let pending = PendingResult::new (Duration::from_secs (1)) . unwrap ();
	let future = BlockingFuture::new (CancelFlag::new (), pending . clone ());

	pending . set_final (Outcome::many ([3_u32, 4, 5]));

	assert! (future . has_value ());
	assert_eq! (future . count (), 3);
	assert_eq! (future . iter () . collect::<Vec <_>> (), vec! [3, 4, 5]);
	assert_eq! (future . or_default (0), 3);
	assert_eq! (future . or_fail () . unwrap (), 3);
	assert_eq! (future . filter (), FilterState::Kept);
}

#[test]
fn derived_futures_follow_their_parent ()
{
	let pending = PendingResult::new (Duration::from_secs (1)) . unwrap ();
	let parent = BlockingFuture::new (CancelFlag::new (), pending . clone ());

	let lengths = parent . subscribe
	(
		|outcome: &Outcome <&'static str>| outcome . clone () . map (str::len)
	);
	let progressive = parent . subscribe
	(
		Progressive (|outcome: &Outcome <&'static str>| outcome . clone () . map (str::len))
	);

	pending . set_partial (Outcome::one ("ab"));
	assert_eq! (progressive . peek_partial_or_none (), Outcome::one (2));
	assert! (lengths . peek_partial_or_none () . is_empty ());

	pending . set_final (Outcome::one ("four"));
	assert_eq! (lengths . wait (Duration::from_secs (1)), Outcome::one (4));
	assert_eq! (progressive . wait (Duration::from_secs (1)), Outcome::one (4));

	assert_eq! (lengths . cause (), parent . id ());
	assert_eq! (lengths . pending () . max_timeout (), Duration::from_secs (1));
}

#[test]
fn deriving_from_a_completed_future_fires_at_once ()
{
	let pending = PendingResult::new (Duration::from_secs (1)) . unwrap ();
	let parent = BlockingFuture::new (CancelFlag::new (), pending . clone ());

	pending . set_final (Outcome::one (20_u32));

	let doubled = parent . subscribe (|outcome: &Outcome <u32>| outcome . clone () . map (|value| value * 2));

	assert! (doubled . is_complete ());
	assert_eq! (doubled . completed (), Some (Outcome::one (40)));
}

#[test]
fn cancelling_a_derived_future_leaves_the_parent_running ()
{
	let pending = PendingResult::new (Duration::from_secs (1)) . unwrap ();
	let parent = BlockingFuture::new (CancelFlag::new (), pending . clone ());
	let derived = parent . subscribe (|outcome: &Outcome <u32>| outcome . clone ());

	assert_eq! (pending . waiter_count (), 1);

	let outcome = derived . cancel ("not interested");

	assert! (outcome . is_cancelled ());
	assert! (! parent . is_complete ());
	assert! (! parent . is_cancelled ());
	assert_eq! (pending . waiter_count (), 0);

	pending . set_final (Outcome::one (1));
	assert! (derived . wait (Duration::from_secs (1)) . is_cancelled ());
}

#[test]
fn a_panicking_operation_yields_an_error ()
{
	let pending = PendingResult::new (Duration::from_secs (1)) . unwrap ();
	let parent = BlockingFuture::new (CancelFlag::new (), pending . clone ());
	let derived: BlockingFuture <u32> = parent . subscribe
	(
		|_: &Outcome <u32>| -> Outcome <u32> { panic! ("operation exploded") }
	);

	pending . set_final (Outcome::one (1));

	assert! (derived . wait (Duration::from_secs (1)) . is_error ());
	assert_eq! (parent . wait (Duration::from_secs (1)), Outcome::one (1));
}

#[test]
fn provenance_walks_back_to_the_root ()
{
	let pending = PendingResult::new (Duration::from_secs (1)) . unwrap ();
	let root = BlockingFuture::new (CancelFlag::new (), pending);
	let child = root . subscribe (|outcome: &Outcome <u32>| outcome . clone ());
	let grandchild = child . subscribe (|outcome: &Outcome <u32>| outcome . clone ());

	assert_eq! (root . cause (), root . id ());
	assert_eq! (grandchild . cause (), child . id ());
	assert_eq! (grandchild . cause_root (), root . id ());
	assert_ne! (child . id (), grandchild . id ());
}
