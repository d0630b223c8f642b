use std::thread;
use std::time::Duration;

use blocking_future::contract::ViolationKind;
use blocking_future::interrupt::Interrupt;
use blocking_future::worker::{CancelFlag, ThreadWorker};
use blocking_future::{Aggregator, BlockingFuture, Outcome, PendingResult};

fn children <V> (ceilings: &[Duration]) -> Vec <(PendingResult <V>, BlockingFuture <V>)>
where V: Clone + Send + 'static
{
	ceilings . iter ()
		. map
		(
			|ceiling|
			{
				let pending = PendingResult::new (*ceiling) . unwrap ();
				let future = BlockingFuture::new (CancelFlag::new (), pending . clone ());
				(pending, future)
			}
		)
		. collect ()
}

fn handles <V> (children: &[(PendingResult <V>, BlockingFuture <V>)]) -> Vec <BlockingFuture <V>>
{
	children . iter () . map (|(_, future)| future . clone ()) . collect ()
}

fn all_of (values: [bool; 4], arrival: [usize; 4]) -> Outcome <bool>
{
	let children = children::<bool> (&[Duration::from_secs (1); 4]);
	let aggregator = Aggregator::all (handles (&children)) . unwrap ();

	for index in arrival
	{
		children [index] . 0 . set_final (Outcome::one (values [index]));
	}

	aggregator . pending () . wait (Duration::from_secs (1))
}

#[test]
fn and_is_independent_of_arrival_order ()
{
	let values = [true, true, false, true];

	assert_eq! (all_of (values, [2, 0, 3, 1]), Outcome::one (false));
	assert_eq! (all_of (values, [0, 1, 2, 3]), Outcome::one (false));
	assert_eq! (all_of ([true; 4], [2, 0, 3, 1]), Outcome::one (true));
	assert_eq! (all_of ([true; 4], [0, 1, 2, 3]), Outcome::one (true));
}

#[test]
fn any_is_true_once_one_child_is_true ()
{
	let children = children::<bool> (&[Duration::from_secs (1); 3]);
	let aggregator = Aggregator::any (handles (&children)) . unwrap ();

	children [0] . 0 . set_final (Outcome::one (false));
	children [1] . 0 . set_final (Outcome::one (true));
	children [2] . 0 . set_final (Outcome::one (false));

	assert_eq! (aggregator . pending () . wait (Duration::from_secs (1)), Outcome::one (true));
}

#[test]
fn folds_in_arrival_order ()
{
	let children = children::<u32> (&[Duration::from_secs (5); 4]);
	let aggregator = Aggregator::new
	(
		handles (&children),
		Outcome::one (0),
		|accumulator: &Outcome <u32>, next: &Outcome <u32>|
		{
			let digits = accumulator . or_default (0);
			Outcome::one (digits * 10 + next . or_default (0))
		}
	) . unwrap ();

	// Children 3, 1, 4, 2 finish in that order, each reporting its own
	// position.
	let producers: Vec <_> = [3_u32, 1, 4, 2] . into_iter () . enumerate ()
		. map
		(
			|(rank, position)|
			{
				let producer = children [position as usize - 1] . 0 . clone ();

				thread::spawn
				(
					move ||
					{
						thread::sleep (Duration::from_millis (100 * (rank as u64 + 1)));
						producer . set_final (Outcome::one (position));
					}
				)
			}
		)
		. collect ();

	let outcome = aggregator . pending () . wait (Duration::from_secs (5));

	for producer in producers
	{
		producer . join () . unwrap ();
	}

	assert_eq! (outcome, Outcome::one (3142));
	assert_eq! (aggregator . collected_count (), 4);
	assert_eq! (aggregator . to_string (), "aggregator <u32> (4 / 4 results collected)");
}

#[test]
fn waits_for_every_child_even_when_one_decides ()
{
	let children = children::<bool> (&[Duration::from_secs (1); 2]);
	let aggregator = Aggregator::all (handles (&children)) . unwrap ();

	children [0] . 0 . set_final (Outcome::one (false));

	assert_eq! (aggregator . collected_count (), 1);
	assert_eq! (aggregator . expected_count (), 2);
	assert! (! aggregator . pending () . is_complete ());
	assert_eq! (aggregator . to_string (), "aggregator <bool> (1 / 2 results collected)");

	children [1] . 0 . set_final (Outcome::one (true));

	assert_eq! (aggregator . pending () . final_value (), Some (Outcome::one (false)));
}

#[test]
fn a_failing_reduction_folds_an_error_instead ()
{
	let children = children::<u32> (&[Duration::from_secs (1); 3]);
	let aggregator = Aggregator::new
	(
		handles (&children),
		Outcome::Success (Vec::new ()),
		|accumulator: &Outcome <u32>, next: &Outcome <u32>| match (accumulator, next)
		{
			(Outcome::Success (seen), Outcome::Success (values)) =>
			{
				if values . contains (&13)
				{
					panic! ("unlucky child");
				}

				Outcome::many (seen . iter () . chain (values) . copied ())
			}
			(Outcome::Error (_), _) => accumulator . clone (),
			(_, other) => other . clone ()
		}
	) . unwrap ();

	children [0] . 0 . set_final (Outcome::one (1));
	children [1] . 0 . set_final (Outcome::one (13));
	children [2] . 0 . set_final (Outcome::one (2));

	match aggregator . pending () . wait (Duration::from_secs (1))
	{
		Outcome::Error (failure) =>
			assert_eq! (failure . message (), "child result could not be reduced"),
		other => panic! ("expected an error, got {:?}", other)
	}

	assert_eq! (aggregator . collected_count (), 3);
}

#[test]
fn ceiling_is_the_slowest_child_ceiling ()
{
	let children = children::<bool>
	(
		&[Duration::from_millis (100), Duration::from_millis (300), Duration::from_millis (200)]
	);
	let aggregator = Aggregator::all (handles (&children)) . unwrap ();

	assert_eq! (aggregator . pending () . max_timeout (), Duration::from_millis (300));
	assert_eq! (aggregator . into_future () . blocking_max (), Duration::from_millis (300));
}

#[test]
fn no_children_is_a_precondition_violation ()
{
	let violation = Aggregator::all (Vec::new ()) . err () . unwrap ();

	assert_eq! (violation . kind, ViolationKind::MustNotBeEmpty);
	assert_eq! (violation . plaintiff, "children");
}

#[test]
fn children_that_time_out_still_count ()
{
	let children = children::<bool> (&[Duration::from_millis (50), Duration::from_secs (1)]);
	let aggregator = Aggregator::all (handles (&children)) . unwrap ();

	children [1] . 0 . set_final (Outcome::one (true));
	assert! (children [0] . 1 . wait (Duration::from_secs (1)) . is_timeout ());

	assert! (aggregator . pending () . wait (Duration::from_secs (1)) . is_timeout ());
}

fn sleeper (interrupt: &Interrupt)
{
	let _ = interrupt . sleep (Duration::from_secs (10));
}

#[test]
fn cancelling_the_aggregate_cancels_every_child ()
{
	let workers: Vec <ThreadWorker> = (0 .. 3) . map (|_| ThreadWorker::new (sleeper)) . collect ();
	let children: Vec <BlockingFuture <bool>> = workers . iter ()
		. map
		(
			|worker|
			{
				let pending = PendingResult::new (Duration::from_secs (10)) . unwrap ();
				BlockingFuture::new (worker . clone (), pending)
			}
		)
		. collect ();

	for worker in &workers
	{
		worker . start () . unwrap ();
	}

	let aggregate = Aggregator::all (children . clone ()) . unwrap () . into_future ();
	let outcome = aggregate . cancel ("shutting down");

	assert! (outcome . is_cancelled ());
	assert! (aggregate . is_cancelled ());

	for child in &children
	{
		assert! (child . is_cancelled ());
		assert! (child . wait (Duration::from_secs (1)) . is_cancelled ());
	}

	for worker in &workers
	{
		worker . join ();
	}

	assert! (aggregate . wait (Duration::from_secs (1)) . is_cancelled ());
}
