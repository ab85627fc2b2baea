//! Control-flow graph construction over the linear instruction stream.
//!
//! Blocks are cut at every branch target and at every instruction
//! immediately following a branch or return. Branch edges are explicit;
//! a block whose last instruction is not a terminator falls through to the
//! next block. A post-pass guarantees exactly one exit: when several return
//! points exist, a synthetic unifying exit block is appended and every
//! return block gains an edge to it.

use smallvec::SmallVec;

use helios_diagnostic::{FrontendError, FrontendResult};
use helios_ir::{Instruction, OpCode};

/// One CFG node: an instruction range plus its edges.
#[derive(Debug, Clone)]
pub struct CfgBlock {
    /// First instruction offset.
    pub start: u32,
    /// Number of instructions; 0 only for the synthetic exit.
    pub len: u32,
    pub successors: SmallVec<[u32; 2]>,
    pub predecessors: SmallVec<[u32; 2]>,
}

/// The per-method control-flow graph. Block 0 is the entry.
#[derive(Debug)]
pub struct ControlFlow {
    blocks: Vec<CfgBlock>,
    exit: u32,
    synthetic_exit: bool,
    rpo: Vec<u32>,
}

impl ControlFlow {
    pub const ENTRY: u32 = 0;

    /// Partition `body` into basic blocks.
    ///
    /// Fails with an internal error on malformed input: an empty body, a
    /// branch target outside the method, control falling off the end, or a
    /// method with no return path. Those indicate a defective upstream
    /// decoder, not a property of the user program.
    pub fn build(body: &[Instruction]) -> FrontendResult<ControlFlow> {
        if body.is_empty() {
            return Err(FrontendError::internal(
                "method body is empty",
                helios_ir::Location::UNKNOWN,
            ));
        }
        let len = body.len() as u32;

        let check_target = |target: u32, instr: &Instruction| -> FrontendResult<u32> {
            if target < len {
                Ok(target)
            } else {
                Err(FrontendError::internal(
                    format!("branch target {target} outside method of length {len}"),
                    instr.location,
                ))
            }
        };

        // Pass 1: leaders.
        let mut leader = vec![false; body.len()];
        leader[0] = true;
        for (i, instr) in body.iter().enumerate() {
            match instr.opcode {
                OpCode::Branch { target } => {
                    leader[check_target(target, instr)? as usize] = true;
                    if i + 1 < body.len() {
                        leader[i + 1] = true;
                    }
                }
                OpCode::ConditionalBranch { if_true, if_false } => {
                    leader[check_target(if_true, instr)? as usize] = true;
                    leader[check_target(if_false, instr)? as usize] = true;
                    if i + 1 < body.len() {
                        leader[i + 1] = true;
                    }
                }
                OpCode::Return => {
                    if i + 1 < body.len() {
                        leader[i + 1] = true;
                    }
                }
                _ => {}
            }
        }

        // Pass 2: block ranges and the offset -> block map.
        let mut blocks = Vec::new();
        let mut block_of = vec![0u32; body.len()];
        for (offset, &is_leader) in leader.iter().enumerate() {
            if is_leader {
                blocks.push(CfgBlock {
                    start: offset as u32,
                    len: 0,
                    successors: SmallVec::new(),
                    predecessors: SmallVec::new(),
                });
            }
            let current = blocks.len() as u32 - 1;
            block_of[offset] = current;
            blocks[current as usize].len += 1;
        }

        // Pass 3: edges.
        let mut edges: Vec<(u32, u32)> = Vec::new();
        let mut return_blocks: Vec<u32> = Vec::new();
        for (index, block) in blocks.iter().enumerate() {
            let index = index as u32;
            let last = &body[(block.start + block.len - 1) as usize];
            match last.opcode {
                OpCode::Branch { target } => edges.push((index, block_of[target as usize])),
                OpCode::ConditionalBranch { if_true, if_false } => {
                    edges.push((index, block_of[if_true as usize]));
                    if if_false != if_true {
                        edges.push((index, block_of[if_false as usize]));
                    }
                }
                OpCode::Return => return_blocks.push(index),
                _ => {
                    // Fallthrough into the next block.
                    let next = block.start + block.len;
                    if next >= len {
                        return Err(FrontendError::internal(
                            "control falls off the end of the method",
                            last.location,
                        ));
                    }
                    edges.push((index, block_of[next as usize]));
                }
            }
        }

        if return_blocks.is_empty() {
            return Err(FrontendError::internal(
                "method has no return path",
                body[0].location,
            ));
        }

        // Post-pass: unify multiple exits behind one synthetic block.
        let synthetic_exit = return_blocks.len() > 1;
        let exit = if synthetic_exit {
            let exit = blocks.len() as u32;
            blocks.push(CfgBlock {
                start: len,
                len: 0,
                successors: SmallVec::new(),
                predecessors: SmallVec::new(),
            });
            for &ret in &return_blocks {
                edges.push((ret, exit));
            }
            exit
        } else {
            return_blocks[0]
        };

        for (from, to) in edges {
            blocks[from as usize].successors.push(to);
            blocks[to as usize].predecessors.push(from);
        }

        let rpo = reverse_postorder(&blocks);
        Ok(ControlFlow {
            blocks,
            exit,
            synthetic_exit,
            rpo,
        })
    }

    pub fn blocks(&self) -> &[CfgBlock] {
        &self.blocks
    }

    pub fn block(&self, index: u32) -> &CfgBlock {
        &self.blocks[index as usize]
    }

    /// The unique exit block.
    pub fn exit(&self) -> u32 {
        self.exit
    }

    /// Whether the exit block was synthesized to unify several returns.
    pub fn has_synthetic_exit(&self) -> bool {
        self.synthetic_exit
    }

    /// Blocks reachable from the entry, in reverse postorder: except for
    /// back edges, every block precedes all of its successors.
    pub fn reverse_postorder(&self) -> &[u32] {
        &self.rpo
    }
}

fn reverse_postorder(blocks: &[CfgBlock]) -> Vec<u32> {
    let mut state = vec![0u8; blocks.len()]; // 0 unvisited, 1 on stack, 2 done
    let mut postorder = Vec::with_capacity(blocks.len());
    // Iterative DFS; the second stack entry is the next successor index.
    let mut stack: Vec<(u32, usize)> = vec![(ControlFlow::ENTRY, 0)];
    state[ControlFlow::ENTRY as usize] = 1;
    while let Some(frame) = stack.last_mut() {
        let block = frame.0;
        let succs = &blocks[block as usize].successors;
        if frame.1 < succs.len() {
            let succ = succs[frame.1];
            frame.1 += 1;
            if state[succ as usize] == 0 {
                state[succ as usize] = 1;
                stack.push((succ, 0));
            }
        } else {
            state[block as usize] = 2;
            postorder.push(block);
            stack.pop();
        }
    }
    postorder.reverse();
    postorder
}
