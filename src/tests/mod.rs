// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod convert;
mod target;
mod walk;
