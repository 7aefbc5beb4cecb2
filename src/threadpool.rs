use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use tracing::{debug, error};

/// Simple threadpool, joining all threads on drop.
///
/// Heavily inspired by the one in the Rust book:
/// https://doc.rust-lang.org/book/ch20-02-multithreaded.html
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<mpsc::Sender<Job>>,
}

impl ThreadPool {
    /// Create a new ThreadPool with `size` threads.
    ///
    /// 'size' must be greater than 0.
    pub fn new(size: usize) -> ThreadPool {
        assert!(size > 0, "ThreadPool size must be greater than 0");

        let mut workers = Vec::with_capacity(size);
        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        for id in 0..size {
            workers.push(Worker::new(id, Arc::clone(&receiver)));
        }
        ThreadPool {
            workers,
            sender: Some(sender),
        }
    }

    /// Queue a task to run on the threadpool when a worker is available.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let job = Box::new(f);
        let sent = self.sender.as_ref().map(|sender| sender.send(job));
        if !matches!(sent, Some(Ok(()))) {
            error!("Thread pool is shut down, dropping job");
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in &mut self.workers {
            if let Some(thread) = worker.handle.take() {
                if thread.join().is_err() {
                    error!(worker = worker.id, "Worker panicked");
                }
            }
        }
    }
}

/// Type of jobs to be executed by the threadpool.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker struct, holding a thread handle.
struct Worker {
    id: usize,
    handle: Option<thread::JoinHandle<()>>,
}

/// Create a new worker that will execute jobs from the given receiver until this one is closed.
impl Worker {
    fn new(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) -> Worker {
        let handle = thread::spawn(move || loop {
            let message = match receiver.lock() {
                Ok(receiver) => receiver.recv(),
                Err(_) => break,
            };
            match message {
                Ok(job) => job(),
                Err(_) => {
                    debug!(worker = id, "Channel closed, worker exiting");
                    break;
                }
            }
        });
        Worker {
            id,
            handle: Some(handle),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_threadpool() {
        let pool = ThreadPool::new(4);
        let results = Arc::new(Mutex::new(Vec::<u64>::new()));

        for i in 0..10 {
            let vec_handle = Arc::clone(&results);
            pool.execute(move || {
                vec_handle.lock().unwrap().push(i);
            });
        }
        // Dropping the pool joins every worker once the queue is drained
        drop(pool);

        let mut results = results.lock().unwrap().clone();
        results.sort();
        assert_eq!(results, (0..10).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic]
    fn test_empty_threadpool() {
        ThreadPool::new(0);
    }
}
